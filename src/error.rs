//! Command Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("metadata store error")]
    Store,
    #[display("settings error")]
    Settings,
    #[display("duplicate detection failed")]
    Duplicates,
    /// Bad input file or argument the parser could not catch.
    #[display("invalid input: {_0}")]
    Input(#[error(not(source))] String),
    #[display("could not write output")]
    Output,
}
