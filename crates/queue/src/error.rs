//! Queue Error Types

use derive_more::{Display, Error};

/// A queue error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The task never produced a value: it was removed by
    /// [`Queue::clear`](crate::Queue::clear) before starting, or it panicked
    /// while running.
    #[display("task cancelled before completion: {_0}")]
    Cancelled(#[error(not(source))] String),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        // A cleared task can simply be enqueued again.
        matches!(self, Self::Cancelled(_))
    }
}
