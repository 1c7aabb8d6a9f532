use crate::wrapper::job::BackupJob;
use getset::Getters;
use itertools::Itertools;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Program and argument list for one `restic backup` run.
///
/// Credentials never appear here. Repository URL, password and cloud keys
/// reach the tool through the process environment only.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct BackupCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl BackupCommand {
    pub fn compose(job: &BackupJob) -> Self {
        let mut args: Vec<OsString> = vec!["backup".into(), "--json".into(), "--exclude-caches".into()];

        if let Some(excludes_path) = job.excludes_path() {
            args.push("--exclude-file".into());
            args.push(excludes_path.into());
        }

        args.push("--cache-dir".into());
        args.push(job.cache_dir().into());
        args.push("--files-from".into());
        args.push(job.files_path().into());

        BackupCommand {
            program: job.restic_binary().clone(),
            args,
        }
    }
}

impl Display for BackupCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.program.to_string_lossy(),
            self.args.iter().map(|a| a.to_string_lossy()).join(" ")
        )
    }
}
