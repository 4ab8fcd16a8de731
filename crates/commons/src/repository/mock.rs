//! In-memory repository for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, Result};
use crate::repository::{MediaRepository, UploadReceipt, UploadRequest};

/// In-memory repository for testing.
///
/// Pages are keyed by filename. Uploads become pages and are recorded in
/// order. Receipts spell the filename with underscores, as MediaWiki does.
#[derive(Default)]
pub struct MockRepository {
    pages: Mutex<HashMap<String, String>>,
    uploads: Mutex<Vec<UploadRequest>>,
    rejection: Option<String>,
    status: Option<u16>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock repository that already holds `pages` (filename, text).
    pub fn with_pages(pages: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let pages = pages.into_iter().map(|(filename, text)| (filename.into(), text.into())).collect();
        Self { pages: Mutex::new(pages), ..Self::default() }
    }

    /// Make every upload fail with `message`.
    pub fn with_rejection(mut self, message: impl Into<String>) -> Self {
        self.rejection = Some(message.into());
        self
    }

    /// Make every call fail with HTTP `status`, as an unreachable API would.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    fn check_status(&self) -> Result<()> {
        match self.status {
            Some(status) => exn::bail!(ErrorKind::Status(status)),
            None => Ok(()),
        }
    }

    /// Uploads accepted so far, in order.
    pub async fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl MediaRepository for MockRepository {
    fn name(&self) -> &str {
        "mock"
    }

    async fn exists(&self, filename: &str) -> Result<bool> {
        self.check_status()?;
        Ok(self.pages.lock().await.contains_key(filename))
    }

    async fn page_text(&self, filename: &str) -> Result<Option<String>> {
        self.check_status()?;
        Ok(self.pages.lock().await.get(filename).cloned())
    }

    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt> {
        self.check_status()?;
        if let Some(message) = &self.rejection {
            exn::bail!(ErrorKind::Rejected(message.clone()));
        }
        self.pages.lock().await.insert(request.filename.clone(), request.text.clone());
        self.uploads.lock().await.push(request.clone());
        Ok(UploadReceipt { filename: request.filename.replace(' ', "_") })
    }
}
