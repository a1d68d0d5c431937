//! Cooperative cancellation for long runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something a run can poll to learn that it should stop early.
pub trait Cancellable {
    /// Returns true once cancellation was requested.
    fn is_cancelled(&self) -> bool;

    /// Requests cancellation.
    fn cancel(&self);
}

/// Shared cancellation flag. Clones observe the same flag.
///
/// The engine checks it before starting each file; files already in
/// progress finish, unstarted ones are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}
