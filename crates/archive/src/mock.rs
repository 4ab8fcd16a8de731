//! In-memory archive for testing.

use std::collections::{HashMap, HashSet};

use async_stream::stream;
use async_trait::async_trait;
use d2c_extract::models::Rendition;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, Result};
use crate::models::{AssetRef, JobHandle, RenditionFile};
use crate::{Archive, AssetRefStream};

const JOB_PREFIX: &str = "/mock/jobs/";

/// In-memory archive for testing.
///
/// Listing pages, asset bytes and job behaviour are fixed up front. Every
/// submitted batch is recorded so tests can assert on batching.
pub struct MockArchive {
    name: String,
    pages: Vec<Vec<AssetRef>>,
    assets: HashMap<AssetRef, Vec<u8>>,
    missing_location: HashSet<usize>,
    remote_error: Option<String>,
    jobs: Mutex<Vec<(Vec<AssetRef>, Rendition)>>,
}

impl MockArchive {
    /// Create a mock archive whose single listing page holds every asset, in order.
    pub fn with_assets(assets: impl IntoIterator<Item = (impl Into<AssetRef>, impl Into<Vec<u8>>)>) -> Self {
        let assets: Vec<(AssetRef, Vec<u8>)> = assets.into_iter().map(|(r, b)| (r.into(), b.into())).collect();
        Self {
            name: "mock".to_string(),
            pages: vec![assets.iter().map(|(r, _)| r.clone()).collect()],
            assets: assets.into_iter().collect(),
            missing_location: HashSet::new(),
            remote_error: None,
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Replace the listing with explicit pages (duplicates allowed).
    pub fn with_pages(mut self, pages: impl IntoIterator<Item = Vec<AssetRef>>) -> Self {
        self.pages = pages.into_iter().collect();
        self
    }

    /// Make the `index`th submission (zero-based) come back without a location.
    pub fn with_missing_location(mut self, index: usize) -> Self {
        self.missing_location.insert(index);
        self
    }

    /// Make every submission fail with an explicit archive error.
    pub fn with_remote_error(mut self, message: impl Into<String>) -> Self {
        self.remote_error = Some(message.into());
        self
    }

    /// Batches submitted so far, in order.
    pub async fn submissions(&self) -> Vec<Vec<AssetRef>> {
        self.jobs.lock().await.iter().map(|(assets, _)| assets.clone()).collect()
    }

    fn href(asset: &AssetRef, rendition: Rendition) -> String {
        format!("{asset}{}", rendition.path_suffix())
    }
}

#[async_trait]
impl Archive for MockArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, path: &str) -> String {
        format!("https://archive.mock{path}")
    }

    fn listing<'a>(&'a self, _query: &'a str, page_limit: usize) -> AssetRefStream<'a> {
        Box::pin(stream! {
            let mut seen = HashSet::new();
            for page in self.pages.iter().take(page_limit) {
                for asset in page {
                    if seen.insert(asset.clone()) {
                        yield Ok(asset.clone());
                    }
                }
            }
        })
    }

    async fn submit(&self, assets: &[AssetRef], rendition: Rendition) -> Result<Option<JobHandle>> {
        if let Some(message) = &self.remote_error {
            exn::bail!(ErrorKind::Remote(message.clone()));
        }
        let mut jobs = self.jobs.lock().await;
        let index = jobs.len();
        jobs.push((assets.to_vec(), rendition));
        if self.missing_location.contains(&index) {
            return Ok(None);
        }
        Ok(Some(JobHandle::new(format!("{JOB_PREFIX}{index}"))))
    }

    async fn await_completion(&self, job: &JobHandle) -> Result<Vec<RenditionFile>> {
        let index: usize = job
            .as_str()
            .strip_prefix(JOB_PREFIX)
            .and_then(|index| index.parse().ok())
            .ok_or_else(|| exn::Exn::from(ErrorKind::Remote(format!("unknown job {job}"))))?;
        let jobs = self.jobs.lock().await;
        let (assets, rendition) =
            jobs.get(index).ok_or_else(|| exn::Exn::from(ErrorKind::Remote(format!("unknown job {job}"))))?;
        Ok(assets
            .iter()
            .map(|asset| RenditionFile { src: asset.to_string(), href: Self::href(asset, *rendition) })
            .collect())
    }

    async fn download(&self, href: &str) -> Result<Vec<u8>> {
        let path = href.strip_prefix("https://archive.mock").unwrap_or(href);
        self.assets
            .iter()
            .find(|(asset, _)| path.strip_prefix(asset.as_str()).is_some_and(|rest| rest.starts_with("/__renditions/")))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| exn::Exn::from(ErrorKind::Status(404)))
    }
}
