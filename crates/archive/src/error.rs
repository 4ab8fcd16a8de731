//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

use crate::consts::MAX_BATCH;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive only accepts a handful of assets per rendition job.
    #[display("batch of {_0} assets exceeds the limit of {}", MAX_BATCH)]
    BatchTooLarge(#[error(not(source))] usize),
    /// The archive answered with an explicit error message (verbatim).
    #[display("archive reported an error: {_0}")]
    Remote(#[error(not(source))] String),
    /// A rendition job did not finish before the polling deadline.
    #[display("rendition job did not finish in time")]
    Timeout,
    /// Connection or transfer failure talking to the given URL.
    #[display("network error requesting {_0}")]
    Network(#[error(not(source))] String),
    /// Non-success HTTP status without a usable error message.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// A job response that isn't the JSON shape the archive normally sends.
    #[display("unexpected response body: {_0}")]
    Decode(#[error(not(source))] String),
    /// The HTTP client could not be constructed.
    #[display("could not construct HTTP client")]
    Client,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
