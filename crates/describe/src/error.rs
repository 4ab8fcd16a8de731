//! Description Error Types

use derive_more::{Display, Error};

/// A description error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for description operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("issue with description or filename template")]
    Template,
    #[display("template produced an unusable filename: {_0:?}")]
    InvalidFilename(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
