use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Opaque archive path naming one asset, e.g.
/// `/fotoweb/archives/5001-Historiske-foto/Indekserte%20bilder/RA_XYZ.tif.info`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef(String);
impl AssetRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<String> for AssetRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl AsRef<str> for AssetRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for AssetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Location token of a server-side rendition job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);
impl JobHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for JobHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// One finished entry of a rendition job. Both paths are relative to the
/// archive's base URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenditionFile {
    /// Human-facing asset page.
    pub src: String,
    /// Rendition download link.
    pub href: String,
}

/// How the listing endpoint is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingFormat {
    /// FotoWeb asset-list API, following `paging.next`.
    #[default]
    Json,
    /// Search result pages scraped for thumbnails (`&p=0`, `&p=1`, …).
    Html,
}

/// Backoff and deadline for polling a rendition job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub timeout: Duration,
}
impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            timeout: Duration::from_secs(300),
        }
    }
}
