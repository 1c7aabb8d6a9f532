//! # restic-wrapper
//!
//! Runs one scheduled restic backup for a named repository and emails an
//! alert when the run fails.
//!
//! ## Flow
//!
//! - **Load**: read `<name>.env`, `<name>.files` and `<name>.excludes` from the config directory
//! - **Compose**: build the `restic backup` argument list, secrets stay in the environment
//! - **Run**: spawn the tool with no stdin, capture stdout/stderr, record exit code and duration
//! - **Notify**: on failure, validate the `RESTIC_EMAIL_*` block and send one email over SMTP
//!
//! The process exit code is always the backup tool's own exit code. Notification
//! problems are logged and never change it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restic_wrapper::wrapper::job::{BackupJob, JobArgs};
//! use restic_wrapper::wrapper::pipeline::run_job;
//!
//! let args = JobArgs::builder()
//!     .backup_name("remote-linode")
//!     .config_dir("/etc/restic")
//!     .cache_dir("/var/cache/restic")
//!     .restic_binary("restic")
//!     .build();
//! let job = BackupJob::load(args)?;
//! let outcome = run_job(&job)?;
//! std::process::exit(outcome.exit_code());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod wrapper;
