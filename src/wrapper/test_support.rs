//! Fake backup tool fixtures shared by the runner and pipeline tests.

use crate::wrapper::command::BackupCommand;
use crate::wrapper::job::{BackupJob, JobArgs};
use crate::wrapper::result_error::result::Result;
use crate::wrapper::runner::{run, ExecutionResult};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Held while writing a fake tool script and while spawning it, so no other
/// test forks with the script still open for writing (ETXTBSY).
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn spawn_guard() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub(crate) struct FakeJob {
    _dir: TempDir,
    job: BackupJob,
}

#[bon::bon]
impl FakeJob {
    #[builder]
    pub(crate) fn new(
        #[builder(into)] script: String,
        #[builder(into)] env: Option<String>,
        #[builder(into)] name: Option<String>,
        #[builder(into)] binary_override: Option<String>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let name = name.unwrap_or_else(|| "remote-linode".to_string());
        let script_path = dir.path().join("restic");
        {
            let _guard = spawn_guard();
            std::fs::write(&script_path, format!("#!/bin/sh\n{script}")).unwrap();
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))
                .unwrap();
        }
        std::fs::write(
            dir.path().join(format!("{name}.env")),
            env.unwrap_or_default(),
        )
        .unwrap();
        std::fs::write(dir.path().join(format!("{name}.files")), "/srv\n").unwrap();

        let job = BackupJob::load(
            JobArgs::builder()
                .backup_name(name)
                .config_dir(dir.path())
                .cache_dir(dir.path().join("cache"))
                .restic_binary(binary_override.map_or(script_path, PathBuf::from))
                .build(),
        )
        .unwrap();

        FakeJob { _dir: dir, job }
    }
}

impl FakeJob {
    pub(crate) fn job(&self) -> &BackupJob {
        &self.job
    }

    pub(crate) fn try_run(&self) -> Result<ExecutionResult> {
        let _guard = spawn_guard();
        run(&BackupCommand::compose(&self.job), self.job.env())
    }

    pub(crate) fn run(&self) -> ExecutionResult {
        self.try_run().unwrap()
    }
}

pub(crate) fn fake_restic(script: &str) -> FakeJob {
    FakeJob::builder().script(script).build()
}
