//! Cooperative cancellation token shared between the manager and one worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Flag polled by a transfer at every chunk boundary.
///
/// Cloning shares the flag; canceling any clone is observed by all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not been canceled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let worker_side = token.clone();
        assert!(!worker_side.is_canceled());

        token.cancel();
        assert!(worker_side.is_canceled());

        token.cancel();
        assert!(token.is_canceled());
    }
}
