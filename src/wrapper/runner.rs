use crate::wrapper::command::BackupCommand;
use crate::wrapper::env_file::EnvFile;
use crate::wrapper::function_path;
use crate::wrapper::result_error::error::Error;
use crate::wrapper::result_error::result::Result;
use crate::wrapper::result_error::AddFunctionName;
use function_name::named;
use getset::{CopyGetters, Getters};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Outcome of one finished backup tool process. Success is exit code 0.
#[derive(Clone, Debug, PartialEq, Eq, Getters, CopyGetters)]
pub struct ExecutionResult {
    #[getset(get_copy = "pub")]
    exit_code: i32,
    #[getset(get = "pub")]
    stdout: String,
    #[getset(get = "pub")]
    stderr: String,
    #[getset(get_copy = "pub")]
    duration: Duration,
}

impl ExecutionResult {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        exit_code: i32,
        stdout: S1,
        stderr: S2,
        duration: Duration,
    ) -> Self {
        ExecutionResult {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs the command to completion with `env` layered over the inherited
/// environment and stdin closed.
///
/// A non-zero exit is a normal `ExecutionResult`. Only a failure to start the
/// process is an error. There is no timeout here, the scheduler owns that.
#[named]
pub fn run(command: &BackupCommand, env: &EnvFile) -> Result<ExecutionResult> {
    tracing::info!("Starting restic backup at {}", chrono::Local::now());
    tracing::info!("Executing: {}", command);

    let started = Instant::now();
    let output = Command::new(command.program())
        .args(command.args())
        .envs(env.iter())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::execution(e, command.program()))
        .add_fn_name(function_path!())?;
    let duration = started.elapsed();

    let result = ExecutionResult::new(
        exit_code_of(output.status),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
        duration,
    );

    for line in result.stdout.lines() {
        tracing::debug!("restic stdout: {}", line);
    }
    for line in result.stderr.lines() {
        tracing::warn!("restic stderr: {}", line);
    }
    tracing::info!(
        "Backup completed with exit code {} after {:.1?}",
        result.exit_code,
        result.duration
    );

    Ok(result)
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::wrapper::result_error::error::EXIT_NOT_FOUND;
    use crate::wrapper::test_support::{fake_restic, FakeJob};

    #[test]
    fn test_run_captures_output_and_exit_code() {
        let fake = fake_restic("echo out-line\necho err-line >&2\nexit 3\n");
        let result = fake.run();

        assert_eq!(result.exit_code(), 3);
        assert!(!result.success());
        assert_eq!(result.stdout(), "out-line\n");
        assert_eq!(result.stderr(), "err-line\n");
    }

    #[test]
    fn test_run_success() {
        let fake = fake_restic("exit 0\n");
        let result = fake.run();
        assert!(result.success());
    }

    #[test]
    fn test_run_passes_env_and_args() {
        let fake = FakeJob::builder()
            .script("echo \"$RESTIC_REPOSITORY|$1|$2\"\n")
            .env("RESTIC_REPOSITORY=/srv/repo\n")
            .build();
        let result = fake.run();

        assert_eq!(result.stdout(), "/srv/repo|backup|--json\n");
    }

    #[test]
    fn test_run_env_overrides_inherited() {
        let fake = FakeJob::builder()
            .script("echo \"$PATH\"\n")
            .env("PATH=/opt/only\n")
            .build();
        assert_eq!(fake.run().stdout(), "/opt/only\n");
    }

    #[test]
    fn test_run_stdin_is_closed() {
        let fake = fake_restic("if read line; then echo got; else echo eof; fi\n");
        assert_eq!(fake.run().stdout(), "eof\n");
    }

    #[test]
    fn test_run_signal_exit_code() {
        let fake = fake_restic("kill -TERM $$\n");
        assert_eq!(fake.run().exit_code(), 128 + 15);
    }

    #[test]
    fn test_run_missing_binary_is_execution_error() {
        let fake = FakeJob::builder()
            .script("exit 0\n")
            .binary_override("/nonexistent/bin/restic")
            .build();
        let err = fake.try_run().unwrap_err();

        assert!(matches!(err.root(), Error::Execution { .. }));
        assert_eq!(err.exit_code(), EXIT_NOT_FOUND);
    }
}
