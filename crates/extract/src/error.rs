//! Extraction Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested rendition name is not one the archive offers.
    #[display("unsupported rendition: {_0}")]
    UnsupportedRendition(#[error(not(source))] String),
    /// The downloaded bytes are neither TIFF nor JPEG.
    #[display("unsupported container type")]
    UnsupportedContainer,
    /// The container structure is too broken to walk.
    #[display("malformed {_0} container")]
    MalformedContainer(#[error(not(source))] &'static str),
    /// The container decoded fine but carries no XMP packet.
    #[display("no XMP metadata found in container")]
    MissingPayload,
    /// The XMP packet is not well-formed XML.
    #[display("malformed XMP: {_0}")]
    MalformedXml(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Same bytes in, same error out.
        false
    }
}
