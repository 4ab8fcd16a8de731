//! Publishing composed documents to a MediaWiki file repository.

mod dispatch;
pub mod error;
pub mod repository;

use std::sync::Arc;

pub use crate::dispatch::{CollisionPolicy, MAX_SUFFIX, Outcome, UploadMode, dispatch};
#[cfg(any(test, feature = "mock"))]
pub use crate::repository::MockRepository;
pub use crate::repository::{MediaRepository, MediaWikiRepository, UploadReceipt, UploadRequest, UploadSource};

pub type RepositoryHandle = Arc<dyn MediaRepository + Send + Sync>;
