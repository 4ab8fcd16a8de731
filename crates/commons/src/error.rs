//! Repository Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A repository error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection or transfer failure talking to the repository API.
    #[display("network error requesting {_0}")]
    Network(#[error(not(source))] String),
    /// Non-success HTTP status from the repository API.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// Credentials were refused.
    #[display("login refused: {_0}")]
    Authentication(#[error(not(source))] String),
    /// The repository refused the request (API error, upload failure).
    #[display("repository rejected request: {_0}")]
    Rejected(#[error(not(source))] String),
    /// Every candidate filename is already taken by a different file.
    #[display("no free filename found for {_0}")]
    Collision(#[error(not(source))] String),
    /// The API answered with something other than the expected JSON.
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
            Self::Network(_) => true,
            Self::Status(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::Network("https://commons".to_string()).is_retryable());
        assert!(ErrorKind::Status(502).is_retryable());
        assert!(!ErrorKind::Rejected("badtoken".to_string()).is_retryable());
        assert!(!ErrorKind::Collision("X.tif".to_string()).is_retryable());
    }
}
