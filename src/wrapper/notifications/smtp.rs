use crate::wrapper::env_file::EnvFile;
use crate::wrapper::function_path;
use crate::wrapper::notifications::{
    Notification, FROM_KEY, SMTP_PASSWORD_KEY, SMTP_PORT_KEY, SMTP_SERVER_KEY, SMTP_TLS_KEY,
    SMTP_USER_KEY, TO_KEY,
};
use crate::wrapper::redacted::RedactedString;
use crate::wrapper::result_error::error::{Error, SettingProblem};
use crate::wrapper::result_error::result::Result;
use crate::wrapper::result_error::{AddFunctionName, AddMsg};
use bon::Builder;
use function_name::named;
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt::Display;

/// Port that speaks TLS from the first byte (SMTPS).
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Validated SMTP settings for failure emails.
///
/// Every field is required. The password is kept in a `RedactedString` so it
/// cannot leak through logs or debug output.
#[derive(Clone, Debug, Builder, Getters, CopyGetters)]
pub struct SmtpNotificationConfig {
    #[builder(into)]
    #[getset(get = "pub")]
    host: String,
    #[getset(get_copy = "pub")]
    port: u16,
    #[getset(get_copy = "pub")]
    smtp_mode: SmtpMode,
    #[builder(into)]
    #[getset(get = "pub")]
    from: Mailbox,
    #[builder(into)]
    #[getset(get = "pub")]
    to: Vec<Mailbox>,
    #[builder(into)]
    #[getset(get = "pub")]
    username: String,
    #[builder(into)]
    #[getset(get = "pub")]
    password: RedactedString,
}

/// SMTP connection security modes
///
/// - `Unsecured`: Plain text connection, credentials sent in the clear
/// - `Ssl`: TLS from the start of the connection
/// - `StartTls`: Plain text connection upgraded with STARTTLS before AUTH
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmtpMode {
    Unsecured,
    Ssl,
    StartTls,
}

impl SmtpMode {
    pub fn select(use_tls: bool, port: u16) -> Self {
        match (use_tls, port) {
            (false, _) => SmtpMode::Unsecured,
            (true, IMPLICIT_TLS_PORT) => SmtpMode::Ssl,
            (true, _) => SmtpMode::StartTls,
        }
    }
}

impl SmtpNotificationConfig {
    /// Builds the config from the `RESTIC_EMAIL_*` keys, collecting every
    /// missing or malformed setting before failing.
    pub fn from_env(env: &EnvFile) -> Result<Self> {
        let mut problems = vec![];

        let to = match env.non_empty(TO_KEY) {
            None => {
                problems.push(SettingProblem::Missing { key: TO_KEY });
                None
            }
            Some(raw) => {
                let mut mailboxes = vec![];
                for entry in raw.split(',').map(str::trim) {
                    match parse_mailbox(TO_KEY, entry) {
                        Ok(mailbox) => mailboxes.push(mailbox),
                        Err(problem) => problems.push(problem),
                    }
                }
                Some(
                    mailboxes
                        .into_iter()
                        .unique_by(|m| m.email.to_string().to_ascii_lowercase())
                        .collect_vec(),
                )
            }
        };

        let from = match env.non_empty(FROM_KEY) {
            None => {
                problems.push(SettingProblem::Missing { key: FROM_KEY });
                None
            }
            Some(raw) => parse_mailbox(FROM_KEY, raw)
                .map_err(|problem| problems.push(problem))
                .ok(),
        };

        let host = required(env, SMTP_SERVER_KEY, &mut problems);

        let port = required(env, SMTP_PORT_KEY, &mut problems).and_then(|raw| {
            match raw.parse::<u16>() {
                Ok(port) if port > 0 => Some(port),
                _ => {
                    problems.push(SettingProblem::Invalid {
                        key: SMTP_PORT_KEY,
                        value: raw.to_string(),
                        reason: "expected an integer between 1 and 65535".into(),
                    });
                    None
                }
            }
        });

        let username = required(env, SMTP_USER_KEY, &mut problems);
        let password = required(env, SMTP_PASSWORD_KEY, &mut problems);

        let use_tls = required(env, SMTP_TLS_KEY, &mut problems).and_then(|raw| {
            match raw.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => {
                    problems.push(SettingProblem::Invalid {
                        key: SMTP_TLS_KEY,
                        value: raw.to_string(),
                        reason: "must be 'true' or 'false'".into(),
                    });
                    None
                }
            }
        });

        match (to, from, host, port, username, password, use_tls) {
            (Some(to), Some(from), Some(host), Some(port), Some(username), Some(password), Some(use_tls))
                if problems.is_empty() =>
            {
                Ok(SmtpNotificationConfig::builder()
                    .host(host)
                    .port(port)
                    .smtp_mode(SmtpMode::select(use_tls, port))
                    .from(from)
                    .to(to)
                    .username(username)
                    .password(password)
                    .build())
            }
            _ => Err(Error::notification_config(problems)),
        }
    }
}

fn required<'a>(
    env: &'a EnvFile,
    key: &'static str,
    problems: &mut Vec<SettingProblem>,
) -> Option<&'a str> {
    let value = env.non_empty(key);
    if value.is_none() {
        problems.push(SettingProblem::Missing { key });
    }
    value
}

fn parse_mailbox(key: &'static str, raw: &str) -> std::result::Result<Mailbox, SettingProblem> {
    if raw.is_empty() {
        return Err(SettingProblem::Invalid {
            key,
            value: raw.to_string(),
            reason: "empty email address".into(),
        });
    }
    raw.parse::<Mailbox>().map_err(|e| SettingProblem::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

impl Notification for SmtpNotificationConfig {
    #[named]
    fn send<D1: Display, D2: Display>(&self, topic: D1, msg: D2) -> Result<()> {
        tracing::info!(
            "Started smtp email notification from {} to {}",
            self.from,
            self.to.iter().join(", ")
        );

        self.deliver(topic, msg)
            .add_fn_name(function_path!())
            .map_err(|e| Error::notification_delivery(self.host.clone(), self.port, e))
    }
}

impl SmtpNotificationConfig {
    fn deliver<D1: Display, D2: Display>(&self, topic: D1, msg: D2) -> Result<()> {
        let email = self
            .to
            .iter()
            .fold(Message::builder(), |email, send_to| email.to(send_to.clone()))
            .from(self.from.clone())
            .subject(topic.to_string())
            .date_now()
            .header(ContentType::TEXT_PLAIN)
            .body(msg.to_string())
            .map_err(Error::from)
            .add_msg(format!(
                "Fail to build notification email from {} to {}",
                self.from,
                self.to.iter().join(", ")
            ))?;

        let creds = Credentials::new(self.username.clone(), self.password.inner().to_string());

        let mailer = match self.smtp_mode {
            SmtpMode::Unsecured => Ok(SmtpTransport::builder_dangerous(self.host.as_str())),
            SmtpMode::Ssl => SmtpTransport::relay(self.host.as_str()),
            SmtpMode::StartTls => SmtpTransport::starttls_relay(self.host.as_str()),
        }
        .map_err(Error::from)
        .add_msg(format!(
            "Failed to build smtp client for host {:?} with mode {:?}",
            self.host, self.smtp_mode
        ))?
        .port(self.port)
        .credentials(creds)
        .build();

        tracing::info!(
            "Sending email via {}:{} ({:?})...",
            self.host,
            self.port,
            self.smtp_mode
        );
        let response = mailer.send(&email).map_err(Error::from)?;
        if response.is_positive() {
            tracing::info!("Notification email accepted by {}", self.host);
            Ok(())
        } else {
            Err(Error::smtp_send_error(response.message().join(" ")))
        }
    }
}
