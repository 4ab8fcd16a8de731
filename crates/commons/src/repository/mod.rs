//! Media repository trait and implementations.

mod mediawiki;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::mediawiki::MediaWikiRepository;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockRepository;
use std::fmt;

use crate::error::Result;
use async_trait::async_trait;

/// Where the file contents come from.
#[derive(Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// Sent with the request as a multipart file part.
    File(Vec<u8>),
    /// Fetched by the repository itself. Needs the `upload_by_url` right.
    Url(String),
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(bytes) => write!(f, "File({} bytes)", bytes.len()),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// Everything needed to publish one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub source: UploadSource,
    /// Destination filename, used unaltered.
    pub filename: String,
    /// Initial description page text.
    pub text: String,
    /// Edit summary.
    pub comment: String,
}

/// What the repository reported back for a successful upload. The name may
/// be spelled differently from the request (underscores for spaces).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: String,
}

/// Destination for uploads. Filenames never carry the `File:` namespace.
///
/// # Examples
///
/// ```
/// use d2c_commons::repository::MediaRepository;
/// use d2c_commons::error::Result;
///
/// async fn is_current(repository: &dyn MediaRepository, filename: &str, text: &str) -> Result<bool> {
///     Ok(repository.page_text(filename).await?.is_some_and(|current| current == text))
/// }
/// ```
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Name of the repository, used for logging only.
    fn name(&self) -> &str;

    async fn exists(&self, filename: &str) -> Result<bool>;

    /// Current description page text, `None` if the file doesn't exist.
    async fn page_text(&self, filename: &str) -> Result<Option<String>>;

    /// Uploads without prompting, ignoring non-fatal warnings.
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt>;
}
