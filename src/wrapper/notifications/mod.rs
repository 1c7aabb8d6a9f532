use crate::wrapper::env_file::EnvFile;
use crate::wrapper::notifications::smtp::SmtpNotificationConfig;
use crate::wrapper::result_error::result::Result;
use std::fmt::Display;

pub mod report;
pub mod smtp;

pub const ENABLED_KEY: &str = "RESTIC_EMAIL_NOTIFICATIONS_ENABLED";
pub const TO_KEY: &str = "RESTIC_EMAIL_TO";
pub const FROM_KEY: &str = "RESTIC_EMAIL_FROM";
pub const SMTP_SERVER_KEY: &str = "RESTIC_EMAIL_SMTP_SERVER";
pub const SMTP_PORT_KEY: &str = "RESTIC_EMAIL_SMTP_PORT";
pub const SMTP_USER_KEY: &str = "RESTIC_EMAIL_SMTP_USER";
pub const SMTP_PASSWORD_KEY: &str = "RESTIC_EMAIL_SMTP_PASSWORD";
pub const SMTP_TLS_KEY: &str = "RESTIC_EMAIL_SMTP_TLS";

/// Whether a failed run should email anyone.
///
/// `Disabled` ignores every other `RESTIC_EMAIL_*` key, valid or not.
/// `Enabled` carries the raw settings, which must pass
/// [`NotificationSettings::validate`] before anything is sent. No setting
/// has a default once enabled.
#[derive(Clone, Debug)]
pub enum NotificationPolicy<'a> {
    Disabled,
    Enabled(NotificationSettings<'a>),
}

impl<'a> NotificationPolicy<'a> {
    /// Only a case-insensitive `true` enables notifications.
    pub fn from_env(env: &'a EnvFile) -> Self {
        match env.get(ENABLED_KEY) {
            Some(v) if v.eq_ignore_ascii_case("true") => {
                NotificationPolicy::Enabled(NotificationSettings { env })
            }
            _ => NotificationPolicy::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, NotificationPolicy::Enabled(_))
    }
}

/// Unvalidated `RESTIC_EMAIL_*` settings of an enabled policy.
#[derive(Clone, Debug)]
pub struct NotificationSettings<'a> {
    env: &'a EnvFile,
}

impl NotificationSettings<'_> {
    /// Checks every setting in one pass and fails with all defects at once.
    pub fn validate(&self) -> Result<SmtpNotificationConfig> {
        SmtpNotificationConfig::from_env(self.env)
    }
}

/// A complete, valid notification block for tests.
#[cfg(test)]
pub(crate) const VALID_ENV: &str = "RESTIC_EMAIL_NOTIFICATIONS_ENABLED=true
RESTIC_EMAIL_TO=ops@example.com, oncall@example.com
RESTIC_EMAIL_FROM=backup@example.com
RESTIC_EMAIL_SMTP_SERVER=smtp.example.com
RESTIC_EMAIL_SMTP_PORT=587
RESTIC_EMAIL_SMTP_USER=backup
RESTIC_EMAIL_SMTP_PASSWORD=app-password
RESTIC_EMAIL_SMTP_TLS=true
";

pub trait Notification {
    fn send<D1: Display, D2: Display>(&self, topic: D1, msg: D2) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(content: &str) -> EnvFile {
        EnvFile::parse("test.env", content).unwrap()
    }

    #[test]
    fn test_policy_disabled_when_absent() {
        let env = env("RESTIC_EMAIL_TO=ops@example.com\n");
        assert!(!NotificationPolicy::from_env(&env).is_enabled());
    }

    #[test]
    fn test_policy_disabled_for_anything_but_true() {
        for value in ["false", "1", "yes", "on", "", "true!", "truee"] {
            let env = env(&format!("{ENABLED_KEY}={value}\n"));
            assert!(
                !NotificationPolicy::from_env(&env).is_enabled(),
                "{value:?} should not enable notifications"
            );
        }
    }

    #[test]
    fn test_policy_enabled_case_insensitive() {
        for value in ["true", "TRUE", "True"] {
            let env = env(&format!("{ENABLED_KEY}={value}\n"));
            assert!(NotificationPolicy::from_env(&env).is_enabled());
        }
    }

    #[test]
    fn test_policy_disabled_ignores_malformed_settings() {
        let env = env(&format!(
            "{ENABLED_KEY}=false\n{SMTP_PORT_KEY}=not-a-port\n{TO_KEY}=garbage\n"
        ));
        match NotificationPolicy::from_env(&env) {
            NotificationPolicy::Disabled => (),
            NotificationPolicy::Enabled(_) => panic!("Expected Disabled"),
        }
    }
}
