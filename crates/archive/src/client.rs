use std::sync::Arc;

use async_trait::async_trait;
use d2c_extract::models::Rendition;
use exn::ResultExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};
use crate::models::{AssetRef, JobHandle, ListingFormat, PollPolicy, RenditionFile};
use crate::rendition::{self, JobStatus};
use crate::{Archive, AssetRefStream, consts, listing};

/// Default archive collection searched by the legacy HTML listing.
pub const DEFAULT_ARCHIVE_PATH: &str = "/fotoweb/archives/5001-Historiske-foto/Indekserte%20bilder/";

/// [`Archive`] backed by a FotoWeb instance over HTTP.
pub struct FotoWebClient {
    client: Client,
    base_url: Arc<str>,
    archive_path: String,
    listing: ListingFormat,
    poll: PollPolicy,
}

impl FotoWebClient {
    /// Create a new client identifying itself with `user_agent`.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build().or_raise(|| ErrorKind::Client)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client with a shared reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/');
        Self {
            client,
            base_url: Arc::from(base_url),
            archive_path: DEFAULT_ARCHIVE_PATH.to_string(),
            listing: ListingFormat::default(),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_listing(mut self, listing: ListingFormat) -> Self {
        self.listing = listing;
        self
    }

    pub fn with_archive_path(mut self, archive_path: impl Into<String>) -> Self {
        self.archive_path = archive_path.into();
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<(StatusCode, String)> {
        let response = request.send().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        let status = response.status();
        let body = response.text().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        Ok((status, body))
    }

    /// Listing pages never fail on content, only on transport.
    async fn listing_page(&self, url: &str, accept: &str) -> Result<String> {
        let (status, body) = self.send(self.client.get(url).header(ACCEPT, accept), url).await?;
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        Ok(body)
    }

    async fn job_status(&self, url: &str) -> Result<JobStatus> {
        let request = self.client.get(url).header(ACCEPT, consts::DOWNLOAD_STATUS_JSON);
        let (status, body) = self.send(request, url).await?;
        rendition::parse_status(status, &body)
    }
}

#[async_trait]
impl Archive for FotoWebClient {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("https://") || path.starts_with("http://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn listing<'a>(&'a self, query: &'a str, page_limit: usize) -> AssetRefStream<'a> {
        match self.listing {
            ListingFormat::Json => listing::walk_json(query, page_limit, move |path| async move {
                self.listing_page(&self.url(&path), consts::ASSET_LIST_JSON).await
            }),
            ListingFormat::Html => listing::walk_html(query, &self.archive_path, page_limit, move |path| async move {
                self.listing_page(&self.url(&path), consts::ACCEPT_HTML).await
            }),
        }
    }

    #[instrument(skip(self, assets), fields(size = assets.len()))]
    async fn submit(&self, assets: &[AssetRef], rendition: Rendition) -> Result<Option<JobHandle>> {
        let url = self.url(consts::SUBMIT_PATH);
        let body = rendition::request_body(assets, rendition);
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, consts::DOWNLOAD_REQUEST_JSON)
            .header(ACCEPT, "application/json")
            .body(body.to_string());
        let (status, body) = self.send(request, &url).await?;
        let job = rendition::parse_submission(status, &body)?;
        debug!(job = ?job, "rendition job submitted");
        Ok(job)
    }

    #[instrument(skip(self, job), fields(job = %job))]
    async fn await_completion(&self, job: &JobHandle) -> Result<Vec<RenditionFile>> {
        let url = self.url(job.as_str());
        rendition::poll(&self.poll, || self.job_status(&url)).await
    }

    #[instrument(skip(self))]
    async fn download(&self, href: &str) -> Result<Vec<u8>> {
        let url = self.url(href);
        let response = self.client.get(&url).send().await.or_raise(|| ErrorKind::Network(url.clone()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Network(url.clone()))?;
        debug!(size = bytes.len(), "downloaded rendition");
        Ok(bytes.to_vec())
    }
}
