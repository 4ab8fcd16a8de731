//! Migrates photographs from the Digitalarkivet photo archive to Wikimedia
//! Commons.
//!
//! [`discover()`] walks an archive listing; [`publish()`] turns the references
//! it found into uploads, batch by batch, reporting progress as a stream of
//! [`PublishEvent`]s.

pub mod error;

use std::time::Duration;

use async_stream::stream;
use d2c_archive::{Archive, AssetRef, MAX_BATCH, RenditionFile};
use d2c_commons::{CollisionPolicy, MediaRepository, Outcome, UploadMode};
use d2c_config::Config;
use d2c_describe::{Composer, ExclusionSet, Templates};
use d2c_extract::models::Rendition;
use exn::ResultExt;
use futures::Stream;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ErrorKind, Result};

/// Everything a publishing run needs besides its endpoints.
pub struct Context {
    pub rendition: Rendition,
    /// Edit summary for every upload.
    pub comment: String,
    /// Wait after a full batch when another batch follows.
    pub batch_pause: Duration,
    pub on_collision: CollisionPolicy,
    pub upload_mode: UploadMode,
    /// Unavailable-repository errors in a row that end the run.
    pub max_consecutive_failures: usize,
    pub composer: Composer,
}

impl Context {
    pub fn from_config(config: &Config) -> Result<Self> {
        let templates = Templates::new(config.templates.description.as_deref(), config.templates.filename.as_deref())
            .or_raise(|| ErrorKind::Config)?;
        Ok(Self {
            rendition: config.publish.rendition,
            comment: config.publish.comment.clone(),
            batch_pause: config.batch_pause(),
            on_collision: config.publish.on_collision,
            upload_mode: config.publish.upload,
            max_consecutive_failures: config.publish.max_consecutive_failures,
            composer: Composer::new(templates),
        })
    }
}

/// Progress of a [`publish()`] run, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    Started { total: usize },
    BatchStarted { index: usize, size: usize },
    Published(Outcome),
    /// The archive accepted the batch but returned no job to follow.
    BatchFailed { index: usize },
    Paused(Duration),
    Complete,
}

/// Tally of a [`publish()`] run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub uploaded: usize,
    pub skipped: usize,
    /// Failed assets plus batches the archive returned no job for.
    pub failed: usize,
    pub complete: bool,
}

impl Summary {
    pub fn record(&mut self, event: &Result<PublishEvent>) {
        match event {
            Ok(PublishEvent::Published(outcome)) if outcome.is_uploaded() => self.uploaded += 1,
            Ok(PublishEvent::Published(_)) => self.skipped += 1,
            Ok(PublishEvent::BatchFailed { .. }) | Err(_) => self.failed += 1,
            Ok(PublishEvent::Complete) => self.complete = true,
            Ok(_) => {},
        }
    }

    /// The tally of a run that completed without failures, an error otherwise.
    pub fn finish(self) -> Result<Self> {
        if !self.complete {
            exn::bail!(ErrorKind::Incomplete);
        }
        if self.failed > 0 {
            exn::bail!(ErrorKind::Failed(self.failed));
        }
        Ok(self)
    }
}

/// Every asset reference the listing for `query` yields, in first-seen order.
#[instrument(skip(archive), fields(archive = archive.name()))]
pub async fn discover(archive: &dyn Archive, query: &str, page_limit: usize) -> Result<Vec<AssetRef>> {
    let assets = archive.discover(query, page_limit).await.or_raise(|| ErrorKind::Archive)?;
    info!(assets = assets.len(), "listing walked");
    Ok(assets)
}

/// Publishes `assets` in batches of up to [`MAX_BATCH`].
///
/// Failing to submit or await a batch ends the stream after yielding the
/// error. Errors for a single asset are yielded and the run moves on to the
/// next asset, unless the repository has been unavailable for
/// `max_consecutive_failures` assets in a row. Restricted sources are
/// remembered for the rest of the run. Dropping the stream cancels the run.
pub fn publish<'a>(
    archive: &'a dyn Archive,
    repository: &'a dyn MediaRepository,
    context: &'a Context,
    assets: &'a [AssetRef],
) -> impl Stream<Item = Result<PublishEvent>> + 'a {
    stream! {
        let mut exclusions = ExclusionSet::new();
        let mut unavailable = 0_usize;
        let batches: Vec<&[AssetRef]> = assets.chunks(MAX_BATCH).collect();
        info!(assets = assets.len(), batches = batches.len(), rendition = %context.rendition, "publishing");
        yield Ok(PublishEvent::Started { total: assets.len() });

        for (index, batch) in batches.iter().enumerate() {
            yield Ok(PublishEvent::BatchStarted { index, size: batch.len() });
            let job = match archive.submit_batch(batch, context.rendition).await.or_raise(|| ErrorKind::Archive) {
                Ok(job) => job,
                Err(err) => {
                    yield Err(err);
                    return;
                },
            };
            match job {
                None => {
                    warn!(index, "archive returned no job location, skipping batch");
                    yield Ok(PublishEvent::BatchFailed { index });
                },
                Some(job) => {
                    let files = match archive.await_completion(&job).await.or_raise(|| ErrorKind::Archive) {
                        Ok(files) => files,
                        Err(err) => {
                            yield Err(err);
                            return;
                        },
                    };
                    debug!(index, files = files.len(), "batch rendered");
                    for file in &files {
                        match publish_file(archive, repository, context, file, &mut exclusions).await {
                            Ok(outcome) => {
                                unavailable = 0;
                                yield Ok(PublishEvent::Published(outcome));
                            },
                            Err(err) => {
                                warn!(src = %file.src, error = %*err, "asset failed");
                                let retryable = err.is_retryable();
                                yield Err(err);
                                if retryable {
                                    unavailable += 1;
                                    if unavailable >= context.max_consecutive_failures {
                                        error!(failures = unavailable, "repository unavailable, stopping");
                                        return;
                                    }
                                }
                            },
                        }
                    }
                },
            }
            if batch.len() == MAX_BATCH && index + 1 < batches.len() {
                yield Ok(PublishEvent::Paused(context.batch_pause));
                tokio::time::sleep(context.batch_pause).await;
            }
        }

        info!(excluded = exclusions.len(), "publishing complete");
        yield Ok(PublishEvent::Complete);
    }
}

#[instrument(skip_all, fields(src = %file.src))]
async fn publish_file(
    archive: &dyn Archive,
    repository: &dyn MediaRepository,
    context: &Context,
    file: &RenditionFile,
    exclusions: &mut ExclusionSet,
) -> Result<Outcome> {
    let source_url = archive.url(&file.src);
    let download_url = archive.url(&file.href);
    let bytes = archive.download(&file.href).await.or_raise(|| ErrorKind::Archive)?;
    let record =
        d2c_extract::extract(&source_url, &download_url, context.rendition, &bytes).or_raise(|| ErrorKind::Extract)?;
    let composition = context
        .composer
        .compose(&record, context.rendition.extension(), &context.comment, exclusions)
        .or_raise(|| ErrorKind::Describe)?;
    let source = context.upload_mode.source(bytes, &download_url);
    d2c_commons::dispatch(repository, &composition, source, context.on_collision).await.map_err(|err| {
        let kind = if err.is_retryable() { ErrorKind::Unavailable } else { ErrorKind::Commons };
        err.raise(kind)
    })
}
