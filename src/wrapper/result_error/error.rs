use crate::wrapper::result_error::{AddFunctionName, AddMsg};
use itertools::Itertools;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use thiserror_ext::Construct;

/// sysexits EX_CONFIG
pub const EXIT_CONFIG: i32 = 78;
/// Shell convention for a command that exists but cannot be executed
pub const EXIT_CANNOT_EXECUTE: i32 = 126;
/// Shell convention for a command that cannot be found
pub const EXIT_NOT_FOUND: i32 = 127;

#[derive(Error, Debug, Construct)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    EmailBuild(#[from] lettre::error::Error),
    #[error(transparent)]
    SmtpTransport(#[from] lettre::transport::smtp::Error),
    #[error("config file not found: {path:?}")]
    ConfigNotFound { path: PathBuf },
    #[error("cannot parse {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },
    #[error("cannot launch backup tool {program:?}: {io_error}")]
    Execution {
        program: PathBuf,
        #[source]
        io_error: std::io::Error,
    },
    #[error("Email notification configuration errors:\n{}", format_problems(.problems))]
    NotificationConfig { problems: Vec<SettingProblem> },
    #[error("Failed to deliver notification via {host}:{port}:\n{}", indent::indent_all_with("  ", error.to_string()))]
    NotificationDelivery {
        host: String,
        port: u16,
        error: Box<Error>,
    },
    #[error("smtp server rejected message: {0}")]
    SmtpSendError(String),
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFnName { fn_name: String, error: Box<Error> },
    #[error("{}", itertools::join(.0, "\n"))]
    LotsOfError(Vec<Error>),
}

/// A single defect found while validating the email notification block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingProblem {
    #[error("{key} is required when RESTIC_EMAIL_NOTIFICATIONS_ENABLED is true")]
    Missing { key: &'static str },
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl SettingProblem {
    pub fn key(&self) -> &'static str {
        match self {
            SettingProblem::Missing { key } => *key,
            SettingProblem::Invalid { key, .. } => *key,
        }
    }
}

fn format_problems(problems: &[SettingProblem]) -> String {
    problems.iter().map(|p| format!("  - {p}")).join("\n")
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Error::WithFnName {
            fn_name: fn_name.into(),
            error: Box::new(self),
        }
    }
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl From<Vec<Error>> for Error {
    fn from(errors: Vec<Error>) -> Self {
        if errors.is_empty() {
            panic!("Should not create lots of errors when error is empty")
        }
        Self::LotsOfError(errors.into_iter().flat_map(|e| e.into_iter()).collect_vec())
    }
}

impl Error {
    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(|e| e.into_iter())),
            e => Box::new(std::iter::once(e)),
        }
    }

    /// Process exit code for an error raised before the backup tool produced
    /// an exit status of its own.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::WithMsg { error, .. } | Error::WithFnName { error, .. } => error.exit_code(),
            Error::LotsOfError(errors) => errors.first().map_or(EXIT_CONFIG, Error::exit_code),
            Error::Execution { io_error, .. } if io_error.kind() == ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            Error::Execution { .. } => EXIT_CANNOT_EXECUTE,
            _ => EXIT_CONFIG,
        }
    }

    /// Strips context wrappers and returns the innermost error.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithMsg { error, .. } | Error::WithFnName { error, .. } => error.root(),
            e => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error);

        match error {
            Error::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_add_msg() {
        let error = Error::config_not_found("/etc/restic/remote.env").add_msg("Custom message");

        match error {
            Error::WithMsg { msg, .. } => assert_eq!(msg, "Custom message"),
            _ => panic!("Expected WithMsg error"),
        }
    }

    #[test]
    fn test_error_add_fn_name_display() {
        let error = Error::config_not_found("/etc/restic/remote.env").add_fn_name("load");
        let error_str = error.to_string();

        assert!(error_str.starts_with("load failed:"));
        assert!(error_str.contains("  config file not found"));
    }

    #[test]
    fn test_error_from_vec_flattens() {
        let nested = Error::from(vec![
            Error::config_not_found("/a"),
            Error::config_not_found("/b"),
        ]);
        let combined = Error::from(vec![nested, Error::config_not_found("/c")]);
        match combined {
            Error::LotsOfError(error_vec) => assert_eq!(error_vec.len(), 3),
            _ => panic!("Expected LotsOfError"),
        }
    }

    #[test]
    #[should_panic(expected = "Should not create lots of errors when error is empty")]
    fn test_error_from_empty_vec_panics() {
        let errors: Vec<Error> = vec![];
        let _error = Error::from(errors);
    }

    #[test]
    fn test_exit_code_for_config_errors() {
        assert_eq!(Error::config_not_found("/a.env").exit_code(), EXIT_CONFIG);
        assert_eq!(
            Error::config_parse("/a.env", "line 3: missing '='").exit_code(),
            EXIT_CONFIG
        );
    }

    #[test]
    fn test_exit_code_for_launch_errors() {
        let missing = Error::execution(
            std::io::Error::new(ErrorKind::NotFound, "no such file"),
            "/nonexistent/restic",
        );
        assert_eq!(missing.exit_code(), EXIT_NOT_FOUND);

        let denied = Error::execution(
            std::io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
            "/etc/passwd",
        )
        .add_msg("Running job");
        assert_eq!(denied.exit_code(), EXIT_CANNOT_EXECUTE);
    }

    #[test]
    fn test_root_skips_context() {
        let error = Error::config_not_found("/a.env")
            .add_fn_name("load")
            .add_msg("outer");
        assert!(matches!(error.root(), Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_notification_config_lists_every_problem() {
        let error = Error::notification_config(vec![
            SettingProblem::Missing {
                key: "RESTIC_EMAIL_TO",
            },
            SettingProblem::Invalid {
                key: "RESTIC_EMAIL_SMTP_PORT",
                value: "abc".into(),
                reason: "not a port number".into(),
            },
        ]);
        let error_str = error.to_string();

        assert!(error_str.starts_with("Email notification configuration errors:\n"));
        assert!(error_str.contains("  - RESTIC_EMAIL_TO is required"));
        assert!(error_str.contains("  - RESTIC_EMAIL_SMTP_PORT has invalid value \"abc\""));
    }
}
