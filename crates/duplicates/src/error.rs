//! Duplicate Detection Error Types

use derive_more::{Display, Error};

/// A duplicate detection error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for duplicate detection.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A chunk worker crashed; its chunk has no result.
    #[display("duplicate check of chunk {_0} failed")]
    Worker(#[error(not(source))] usize),
    /// A chunk was removed from the queue before it ran.
    #[display("duplicate check of chunk {_0} was cancelled")]
    Cancelled(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
