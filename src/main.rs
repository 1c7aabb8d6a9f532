use clap::Parser;
use restic_wrapper::wrapper::job::{BackupJob, JobArgs};
use restic_wrapper::wrapper::pipeline::run_job;
use restic_wrapper::wrapper::result_error::AddMsg;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;

/// Run one restic backup and email on failure
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Name of the backup, selects <CONFIG_DIR>/<BACKUP_NAME>.{env,files,excludes}
    backup_name: String,
    /// Directory holding the per-backup env and file lists
    config_dir: PathBuf,
    /// restic cache directory
    cache_dir: PathBuf,
    /// Path to the restic binary, or a name found on PATH
    restic_binary: PathBuf,
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let job_args = JobArgs::builder()
        .backup_name(args.backup_name)
        .config_dir(args.config_dir)
        .cache_dir(args.cache_dir)
        .restic_binary(args.restic_binary)
        .build();
    let name = job_args.backup_name().clone();

    let res = BackupJob::load(job_args)
        .and_then(|job| run_job(&job))
        .add_msg(format!("Backup {name:?} aborted"));

    match res {
        Ok(outcome) => exit(outcome.exit_code()),
        Err(e) => {
            error!("{e}");
            exit(e.exit_code())
        }
    }
}
