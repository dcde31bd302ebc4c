//! The interface the core calls into: confirmations, notices and progress.
//!
//! The core never renders anything itself. A GUI, the terminal binary and the
//! test doubles all implement [`Frontend`].

use crate::download::DownloadTask;

/// Severity of a one-line notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A one-line message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Notification and confirmation sink.
pub trait Frontend {
    /// Asks a yes/no question. Returning false aborts the action.
    fn confirm(&self, prompt: &str) -> bool;

    /// Reports the outcome of an action.
    fn notify(&self, notice: &Notice);

    /// Called whenever an active task changed and should be re-rendered.
    fn task_updated(&self, _task: &DownloadTask) {}
}
