//! Settings Error Types

use derive_more::{Display, Error};

/// A settings error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading from or writing to the metadata store failed.
    #[display("metadata store error")]
    Store,
    /// A settings object could not be converted to or from metadata values.
    #[display("invalid setting value: {_0}")]
    InvalidValue(#[error(not(source))] String),
    /// The name does not match any settings domain, reading mode or layout.
    #[display("unknown {_0}")]
    Unknown(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
