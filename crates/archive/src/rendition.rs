//! Rendition job payloads and the polling loop.

use std::future::Future;

use d2c_extract::models::Rendition;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::error::{ErrorKind, Result};
use crate::models::{AssetRef, JobHandle, PollPolicy, RenditionFile};
use crate::consts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JobStatus {
    Pending,
    Done(Vec<RenditionFile>),
}

/// `{"request":{"assets":[{"href":"<asset><suffix>"}, ...]}}`
pub(crate) fn request_body(assets: &[AssetRef], rendition: Rendition) -> Value {
    let assets: Vec<Value> =
        assets.iter().map(|asset| json!({ "href": format!("{asset}{}", rendition.path_suffix()) })).collect();
    json!({ "request": { "assets": assets } })
}

/// An explicit error message anywhere the archive is known to put one.
fn remote_message(value: &Value) -> Option<String> {
    let message = match value.get("error") {
        Some(Value::String(message)) => Some(message.as_str()),
        Some(Value::Object(error)) => error.get("message").and_then(Value::as_str),
        _ => None,
    }
    .or_else(|| value.get("message").and_then(Value::as_str))?;
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

fn parse_body(status: StatusCode, body: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            if let Some(message) = remote_message(&value) {
                exn::bail!(ErrorKind::Remote(message));
            }
            if !status.is_success() {
                exn::bail!(ErrorKind::Status(status.as_u16()));
            }
            Ok(value)
        },
        Err(_) if !status.is_success() => exn::bail!(ErrorKind::Status(status.as_u16())),
        Err(err) => exn::bail!(ErrorKind::Decode(err.to_string())),
    }
}

/// Response to a job submission. A missing or empty `location` is reported
/// as `None`, not as an error.
pub(crate) fn parse_submission(status: StatusCode, body: &str) -> Result<Option<JobHandle>> {
    let value = parse_body(status, body)?;
    Ok(value
        .get("location")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .map(JobHandle::new))
}

/// Response to a job status request.
pub(crate) fn parse_status(status: StatusCode, body: &str) -> Result<JobStatus> {
    let value = parse_body(status, body)?;
    let job = value.get("job").unwrap_or(&Value::Null);
    if job.get("status").and_then(Value::as_str) != Some(consts::JOB_DONE) {
        return Ok(JobStatus::Pending);
    }
    let files = match job.pointer("/result/files") {
        Some(files) => {
            serde_json::from_value(files.clone()).map_err(|err| ErrorKind::Decode(err.to_string()))?
        },
        None => Vec::new(),
    };
    Ok(JobStatus::Done(files))
}

/// Calls `fetch` until the job is done, backing off exponentially between
/// attempts. Gives up with [`ErrorKind::Timeout`] once the policy's deadline
/// passes; dropping the future cancels the wait.
pub(crate) async fn poll<F, Fut>(policy: &PollPolicy, fetch: F) -> Result<Vec<RenditionFile>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobStatus>>,
{
    match tokio::time::timeout(policy.timeout, poll_until_done(policy, fetch)).await {
        Ok(result) => result,
        Err(_) => exn::bail!(ErrorKind::Timeout),
    }
}

async fn poll_until_done<F, Fut>(policy: &PollPolicy, mut fetch: F) -> Result<Vec<RenditionFile>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobStatus>>,
{
    let mut delay = policy.initial_backoff;
    let mut attempt = 1_u32;
    loop {
        if let JobStatus::Done(files) = fetch().await? {
            debug!(attempt, files = files.len(), "rendition job done");
            return Ok(files);
        }
        trace!(attempt, delay_ms = delay.as_millis() as u64, "rendition job pending");
        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2).min(policy.max_backoff);
        attempt += 1;
    }
}
