//! Everything this system needs from the archive: walking a listing,
//! rendition jobs, and downloads.

mod client;
mod consts;
pub mod error;
mod listing;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod models;
mod rendition;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use d2c_extract::models::Rendition;
use futures::{Stream, TryStreamExt};

pub use crate::client::{DEFAULT_ARCHIVE_PATH, FotoWebClient};
pub use crate::consts::MAX_BATCH;
use crate::error::{ErrorKind, Result};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockArchive;
pub use crate::models::{AssetRef, JobHandle, ListingFormat, PollPolicy, RenditionFile};

pub type AssetRefStream<'a> = Pin<Box<dyn Stream<Item = Result<AssetRef>> + Send + 'a>>;

/// Source archive of photographs.
///
/// # Examples
///
/// ```
/// use d2c_archive::{Archive, error::Result};
/// use d2c_extract::models::Rendition;
///
/// async fn first_bytes(archive: &dyn Archive, query: &str) -> Result<Option<Vec<u8>>> {
///     let assets = archive.discover(query, 1).await?;
///     let Some(batch) = assets.chunks(4).next() else { return Ok(None) };
///     let Some(job) = archive.submit_batch(batch, Rendition::Tif).await? else { return Ok(None) };
///     match archive.await_completion(&job).await?.first() {
///         Some(file) => Ok(Some(archive.download(&file.href).await?)),
///         None => Ok(None),
///     }
/// }
/// ```
#[async_trait]
pub trait Archive: Send + Sync {
    /// Name of the archive, used for logging only.
    fn name(&self) -> &str;

    /// Absolute URL for an archive-relative path. Absolute URLs pass through.
    fn url(&self, path: &str) -> String;

    /// Walks the listing for `query`, reading at most `page_limit` pages.
    ///
    /// References are yielded once each, in first-seen order. A page that
    /// can't be understood contributes nothing; only transport failures are
    /// errors.
    fn listing<'a>(&'a self, query: &'a str, page_limit: usize) -> AssetRefStream<'a>;

    /// Collects [`listing()`](Self::listing) into a [`Vec`].
    async fn discover(&self, query: &str, page_limit: usize) -> Result<Vec<AssetRef>> {
        self.listing(query, page_limit).try_collect().await
    }

    /// Requests `rendition` for up to [`MAX_BATCH`] assets.
    ///
    /// Larger batches are rejected before anything is sent. `None` means the
    /// archive accepted the request but handed back no job location.
    async fn submit_batch(&self, assets: &[AssetRef], rendition: Rendition) -> Result<Option<JobHandle>> {
        if assets.len() > MAX_BATCH {
            exn::bail!(ErrorKind::BatchTooLarge(assets.len()));
        }
        self.submit(assets, rendition).await
    }

    /// Unchecked submission; use [`submit_batch()`](Self::submit_batch).
    async fn submit(&self, assets: &[AssetRef], rendition: Rendition) -> Result<Option<JobHandle>>;

    /// Waits for a submitted job to finish and returns its files.
    async fn await_completion(&self, job: &JobHandle) -> Result<Vec<RenditionFile>>;

    /// Raw bytes behind a rendition file's `href`.
    async fn download(&self, href: &str) -> Result<Vec<u8>>;
}

pub type ArchiveHandle = Arc<dyn Archive + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Panics on any network-facing call.
    struct Unreachable;

    #[async_trait]
    impl Archive for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn url(&self, path: &str) -> String {
            path.to_string()
        }

        fn listing<'a>(&'a self, _query: &'a str, _page_limit: usize) -> AssetRefStream<'a> {
            unreachable!()
        }

        async fn submit(&self, _assets: &[AssetRef], _rendition: Rendition) -> Result<Option<JobHandle>> {
            unreachable!()
        }

        async fn await_completion(&self, _job: &JobHandle) -> Result<Vec<RenditionFile>> {
            unreachable!()
        }

        async fn download(&self, _href: &str) -> Result<Vec<u8>> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_before_submission() {
        let assets: Vec<AssetRef> = (0..5).map(|i| AssetRef::new(format!("/a/{i}.tif.info"))).collect();
        let err = Unreachable.submit_batch(&assets, Rendition::Tif).await.unwrap_err();
        assert_eq!(*err, ErrorKind::BatchTooLarge(5));
    }
}
