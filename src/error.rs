//! Pipeline Error Types
//!
//! Each variant marks the stage that failed; the underlying crate error is
//! kept as the child of the error tree.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("archive request failed")]
    Archive,
    #[display("could not extract metadata")]
    Extract,
    #[display("could not compose description")]
    Describe,
    #[display("upload failed")]
    Commons,
    /// The repository could not be reached or answered with a server error.
    #[display("repository unavailable")]
    Unavailable,
    #[display("configuration error")]
    Config,
    /// The run stopped before every batch was handled.
    #[display("run ended early")]
    Incomplete,
    #[display("{_0} asset(s) or batch(es) failed")]
    Failed(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Only an unavailable repository may come back; the pipeline itself never
    /// retries, it gives up after enough of these in a row.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}
