use std::fmt;
use std::str::FromStr;

use d2c_describe::{Composition, Document};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{ErrorKind, Result};
use crate::repository::{MediaRepository, UploadRequest, UploadSource};

/// Numbered alternatives tried before giving up on a filename.
pub const MAX_SUFFIX: usize = 99;

/// What to do when the destination filename is already taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the existing file alone.
    #[default]
    Skip,
    /// Upload under `"<stem> <n><ext>"`, unless the existing page already
    /// carries the same description.
    Suffix,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Suffix => "suffix",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "suffix" => Ok(Self::Suffix),
            other => Err(format!("unknown collision policy: {other}")),
        }
    }
}

/// How file contents reach the repository.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Send the downloaded bytes with the request.
    #[default]
    File,
    /// Let the repository fetch the archive download URL itself.
    Url,
}

impl UploadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
        }
    }

    /// Picks the source for one file: its bytes or the URL they came from.
    pub fn source(&self, bytes: Vec<u8>, download_url: &str) -> UploadSource {
        match self {
            Self::File => UploadSource::File(bytes),
            Self::Url => UploadSource::Url(download_url.to_string()),
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            other => Err(format!("unknown upload mode: {other}")),
        }
    }
}

/// What happened to one composed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Uploaded under the given filename.
    Uploaded(String),
    /// A file with this name (and, for suffixing, the same description) is
    /// already present.
    SkippedExists(String),
    /// The archive record is restricted or shares a restricted source.
    SkippedExcluded(String),
}

impl Outcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }
}

/// Uploads a composed document unless it is excluded or already present.
///
/// `source` is consumed by the first upload attempt. The edit summary is the
/// one stamped on the document at composition time. The reported filename is
/// the one requested, not the repository's respelling of it.
#[instrument(skip_all, fields(repository = repository.name(), filename = %composition.document.filename))]
pub async fn dispatch(
    repository: &dyn MediaRepository,
    composition: &Composition,
    source: UploadSource,
    on_collision: CollisionPolicy,
) -> Result<Outcome> {
    let document = &composition.document;
    if composition.exclude {
        info!(source = %document.source_url, "excluded, not uploading");
        return Ok(Outcome::SkippedExcluded(document.source_url.clone()));
    }
    if !repository.exists(&document.filename).await? {
        return upload(repository, document, &document.filename, source).await;
    }
    match on_collision {
        CollisionPolicy::Skip => {
            info!("already exists, skipping");
            Ok(Outcome::SkippedExists(document.filename.clone()))
        },
        CollisionPolicy::Suffix => {
            if is_same_description(repository, document, &document.filename).await? {
                info!("already uploaded with this description");
                return Ok(Outcome::SkippedExists(document.filename.clone()));
            }
            for n in 1..=MAX_SUFFIX {
                let candidate = document.numbered_filename(n);
                if !repository.exists(&candidate).await? {
                    debug!(%candidate, "filename taken, using numbered alternative");
                    return upload(repository, document, &candidate, source).await;
                }
                if is_same_description(repository, document, &candidate).await? {
                    info!(%candidate, "already uploaded with this description");
                    return Ok(Outcome::SkippedExists(candidate));
                }
            }
            exn::bail!(ErrorKind::Collision(document.filename.clone()))
        },
    }
}

async fn is_same_description(repository: &dyn MediaRepository, document: &Document, filename: &str) -> Result<bool> {
    Ok(repository.page_text(filename).await?.is_some_and(|text| text.trim() == document.text.trim()))
}

async fn upload(
    repository: &dyn MediaRepository,
    document: &Document,
    filename: &str,
    source: UploadSource,
) -> Result<Outcome> {
    let request = UploadRequest {
        source,
        filename: filename.to_string(),
        text: document.text.clone(),
        comment: document.comment.clone(),
    };
    let receipt = repository.upload(&request).await?;
    info!(filename, stored = %receipt.filename, "uploaded");
    Ok(Outcome::Uploaded(filename.to_string()))
}
