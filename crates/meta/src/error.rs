//! Metadata Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// The backend could not be reached.
    #[display("network error")]
    Network,
    /// The backend answered, but refused the operation.
    #[display("backend rejected the request: {_0}")]
    Rejected(#[error(not(source))] String),
    /// Stored or received data could not be (de)serialized.
    #[display("invalid metadata: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// A holder reference (`kind[:id]`) could not be parsed.
    #[display("invalid metadata holder: {_0}")]
    InvalidHolder(#[error(not(source))] String),
    /// Some keys of a multi-key update were written, others were not.
    /// Nothing is rolled back.
    #[display("partial metadata write: {} written, {} failed ({})", written.len(), failed.len(), failed.join(", "))]
    PartialWrite {
        /// Keys whose write failed.
        failed: Vec<String>,
        /// Keys written successfully.
        written: Vec<String>,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database | Self::Network | Self::PartialWrite { .. })
    }
}
