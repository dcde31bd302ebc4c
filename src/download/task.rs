//! Download task records shared by the manager, history and frontends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::TransferProgress;

/// Lifecycle state of one transfer.
///
/// `Starting -> Downloading -> {Completed | Canceled | Failed}`, with
/// `Canceling` entered on request and resolved by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Starting,
    Downloading,
    Completed,
    Canceling,
    Canceled,
    Failed { reason: String },
}

impl TaskStatus {
    /// Returns true for states a task never leaves.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed { .. })
    }

    /// Short label used in listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Canceling => "canceling",
            Self::Canceled => "canceled",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One active or historical transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Manager-assigned id, unique within one process.
    #[serde(default)]
    pub id: u64,
    pub app_name: String,
    /// Completed fraction, always within `[0.0, 1.0]`.
    pub progress: f64,
    pub status: TaskStatus,
    /// Time of the last update.
    pub timestamp: DateTime<Utc>,
    pub target_version: String,
    #[serde(default)]
    pub status_text: String,
}

impl DownloadTask {
    /// Creates a task in the `Starting` state.
    #[must_use]
    pub fn new(id: u64, app_name: impl Into<String>, target_version: impl Into<String>) -> Self {
        Self {
            id,
            app_name: app_name.into(),
            progress: 0.0,
            status: TaskStatus::Starting,
            timestamp: Utc::now(),
            target_version: target_version.into(),
            status_text: "Starting".to_string(),
        }
    }

    /// Returns true while the task still occupies its name.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Applies a byte count reported by the worker.
    ///
    /// The fraction never regresses and is left untouched when the total size
    /// is unknown. A task being canceled keeps its `Canceling` status.
    pub fn apply_progress(&mut self, transfer: TransferProgress) {
        if self.status.is_terminal() {
            return;
        }
        if self.status == TaskStatus::Starting {
            self.status = TaskStatus::Downloading;
        }

        match transfer.fraction() {
            Some(fraction) => {
                if fraction > self.progress {
                    self.progress = fraction;
                }
                self.status_text = format!("Downloading: {}%", percent(self.progress));
            }
            None => {
                self.status_text =
                    format!("Downloading... {}", format_bytes(transfer.bytes_written));
            }
        }
        self.timestamp = Utc::now();
    }

    /// Requests cancellation; returns false when the task already finished.
    pub fn mark_canceling(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Canceling;
        self.status_text = "Canceling".to_string();
        self.timestamp = Utc::now();
        true
    }

    /// Moves the task to a terminal state.
    pub fn finish(&mut self, status: TaskStatus) {
        self.status_text = match &status {
            TaskStatus::Completed => {
                self.progress = 1.0;
                "Installed".to_string()
            }
            TaskStatus::Canceled => "Canceled".to_string(),
            TaskStatus::Failed { reason } => format!("Failed: {reason}"),
            other => other.label().to_string(),
        };
        self.status = status;
        self.timestamp = Utc::now();
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).floor() as u8
}

/// Formats a byte count for status lines (`512 B`, `3.1 MiB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn known(bytes_written: u64, total: u64) -> TransferProgress {
        TransferProgress {
            bytes_written,
            content_length: Some(total),
        }
    }

    #[test]
    fn test_progress_is_monotone_and_bounded() {
        let mut task = DownloadTask::new(1, "Foo", "1.0");
        let mut last = task.progress;
        for written in [10, 40, 30, 100, 250] {
            task.apply_progress(known(written, 100));
            assert!(task.progress >= last, "progress regressed to {}", task.progress);
            assert!((0.0..=1.0).contains(&task.progress));
            last = task.progress;
        }
        assert!((task.progress - 1.0).abs() < f64::EPSILON);
        assert_eq!(task.status, TaskStatus::Downloading);
        assert_eq!(task.status_text, "Downloading: 100%");
    }

    #[test]
    fn test_unknown_length_keeps_fraction_and_shows_indeterminate_text() {
        let mut task = DownloadTask::new(1, "Foo", "1.0");
        task.apply_progress(known(25, 100));
        task.apply_progress(TransferProgress {
            bytes_written: 3 * 1024 * 1024,
            content_length: None,
        });
        assert!((task.progress - 0.25).abs() < f64::EPSILON);
        assert_eq!(task.status_text, "Downloading... 3.0 MiB");
    }

    #[test]
    fn test_canceling_survives_late_progress() {
        let mut task = DownloadTask::new(1, "Foo", "1.0");
        assert!(task.mark_canceling());
        task.apply_progress(known(50, 100));
        assert_eq!(task.status, TaskStatus::Canceling);
        assert!(task.is_active());
    }

    #[test]
    fn test_finished_task_ignores_further_updates() {
        let mut task = DownloadTask::new(1, "Foo", "1.0");
        task.finish(TaskStatus::Failed {
            reason: "HTTP 404".to_string(),
        });
        task.apply_progress(known(50, 100));
        assert!(!task.mark_canceling());
        assert_eq!(task.status.label(), "failed");
        assert_eq!(task.status_text, "Failed: HTTP 404");
        assert!(task.progress.abs() < f64::EPSILON);
    }

    #[test]
    fn test_completed_task_reports_full_progress() {
        let mut task = DownloadTask::new(1, "Foo", "1.0");
        task.apply_progress(TransferProgress {
            bytes_written: 10,
            content_length: None,
        });
        task.finish(TaskStatus::Completed);
        assert!((task.progress - 1.0).abs() < f64::EPSILON);
        assert!(!task.is_active());
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let failed = TaskStatus::Failed {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_string(&failed).unwrap();
        assert_eq!(json, r#"{"failed":{"reason":"timeout"}}"#);
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            r#""completed""#
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GiB");
    }
}
