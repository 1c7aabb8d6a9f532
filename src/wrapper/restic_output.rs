//! Reading the `--json` output of `restic backup`.
//!
//! restic writes one JSON object per line. Only `summary`, `error` and
//! `exit_error` messages are kept; status updates and non-JSON lines are
//! skipped.

use itertools::Itertools;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackupSummary {
    pub snapshot_id: Option<String>,
    pub files_new: u64,
    pub files_changed: u64,
    pub files_unmodified: u64,
    pub data_added: u64,
    pub total_files_processed: u64,
    pub total_bytes_processed: u64,
    pub total_duration: f64,
}

impl Display for BackupSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "snapshot {}: {} new, {} changed, {} unmodified files, {} bytes added, {} files / {} bytes processed in {:.1}s",
            self.snapshot_id.as_deref().unwrap_or("<none>"),
            self.files_new,
            self.files_changed,
            self.files_unmodified,
            self.data_added,
            self.total_files_processed,
            self.total_bytes_processed,
            self.total_duration
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "message_type")]
#[serde(rename_all = "snake_case")]
pub enum ResticMessage {
    Summary(BackupSummary),
    Error {
        #[serde(default)]
        error: ErrorDetail,
        #[serde(default)]
        during: String,
        #[serde(default)]
        item: String,
    },
    ExitError {
        #[serde(default)]
        code: i32,
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Other,
}

/// What could be learned from one run's captured output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResticReport {
    pub summary: Option<BackupSummary>,
    pub errors: Vec<String>,
}

impl ResticReport {
    pub fn scan<'a, I: IntoIterator<Item = &'a str>>(outputs: I) -> Self {
        let mut report = ResticReport::default();
        for line in outputs.into_iter().flat_map(str::lines).map(str::trim) {
            if !line.starts_with('{') {
                continue;
            }
            match serde_json::from_str::<ResticMessage>(line) {
                Ok(ResticMessage::Summary(summary)) => report.summary = Some(summary),
                Ok(ResticMessage::Error {
                    error,
                    during,
                    item,
                }) => report.errors.push(
                    [during.as_str(), item.as_str(), error.message.as_str()]
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .join(": "),
                ),
                Ok(ResticMessage::ExitError { code, message }) => {
                    report.errors.push(format!("exit {code}: {message}"))
                }
                Ok(ResticMessage::Other) => {}
                Err(e) => tracing::trace!("Skipping unparsable restic line: {e}"),
            }
        }
        report
    }
}
