use crate::wrapper::command::BackupCommand;
use crate::wrapper::function_path;
use crate::wrapper::job::BackupJob;
use crate::wrapper::notifications::report::FailureReport;
use crate::wrapper::notifications::smtp::SmtpNotificationConfig;
use crate::wrapper::notifications::{Notification, NotificationPolicy};
use crate::wrapper::restic_output::ResticReport;
use crate::wrapper::result_error::result::Result;
use crate::wrapper::result_error::AddFunctionName;
use crate::wrapper::runner::{run, ExecutionResult};
use function_name::named;
use getset::Getters;

/// What happened to the failure email of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The backup succeeded.
    NotNeeded,
    Disabled,
    Sent,
    /// Enabled but the settings failed validation, nothing was sent.
    ConfigInvalid,
    DeliveryFailed,
}

#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct RunOutcome {
    result: ExecutionResult,
    restic: ResticReport,
    notification: NotificationOutcome,
}

impl RunOutcome {
    /// Always the backup tool's exit code, whatever happened to the email.
    pub fn exit_code(&self) -> i32 {
        self.result.exit_code()
    }
}

/// Runs the job and emails over SMTP if it failed and notifications are on.
pub fn run_job(job: &BackupJob) -> Result<RunOutcome> {
    run_job_with(job, |config, report| {
        config.send(report.subject(), report.body())
    })
}

/// Like [`run_job`] with the delivery step supplied by the caller. `dispatch`
/// is called at most once, only for a failed run with valid settings.
///
/// Only a failure to launch the backup tool is returned as an error.
/// Notification problems are logged and recorded in the outcome.
#[named]
pub fn run_job_with<F>(job: &BackupJob, dispatch: F) -> Result<RunOutcome>
where
    F: FnOnce(&SmtpNotificationConfig, &FailureReport) -> Result<()>,
{
    let command = BackupCommand::compose(job);
    let result = run(&command, job.env()).add_fn_name(function_path!())?;
    let restic = ResticReport::scan([result.stdout().as_str(), result.stderr().as_str()]);

    if result.success() {
        match &restic.summary {
            Some(summary) => tracing::info!("Backup {} succeeded, {}", job.name(), summary),
            None => tracing::info!("Backup {} succeeded", job.name()),
        }
        return Ok(RunOutcome {
            result,
            restic,
            notification: NotificationOutcome::NotNeeded,
        });
    }

    tracing::error!(
        "Backup {} failed with exit code {}",
        job.name(),
        result.exit_code()
    );
    for error in &restic.errors {
        tracing::error!("restic: {}", error);
    }

    let notification = notify_failure(job, &result, &restic, dispatch);
    Ok(RunOutcome {
        result,
        restic,
        notification,
    })
}

fn notify_failure<F>(
    job: &BackupJob,
    result: &ExecutionResult,
    restic: &ResticReport,
    dispatch: F,
) -> NotificationOutcome
where
    F: FnOnce(&SmtpNotificationConfig, &FailureReport) -> Result<()>,
{
    let settings = match NotificationPolicy::from_env(job.env()) {
        NotificationPolicy::Disabled => {
            tracing::info!("Email notifications disabled for {}", job.name());
            return NotificationOutcome::Disabled;
        }
        NotificationPolicy::Enabled(settings) => settings,
    };

    let config = match settings.validate() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            tracing::error!("Skipping failure notification for {}", job.name());
            return NotificationOutcome::ConfigInvalid;
        }
    };

    let report = FailureReport::new(job, result, restic);
    match dispatch(&config, &report) {
        Ok(()) => {
            tracing::info!("Failure notification sent for {}", job.name());
            NotificationOutcome::Sent
        }
        Err(e) => {
            tracing::error!("Failed to send email notification: {e}");
            NotificationOutcome::DeliveryFailed
        }
    }
}
