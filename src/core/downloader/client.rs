use std::path::Path;
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, RANGE, USER_AGENT};
use reqwest::Url;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::error::{AttemptError, DownloadError};
use super::progress::ProgressTracker;
use super::request::{RetryPolicy, TransferRequest};
use super::transport::{Transport, TransportPool};
use super::trust::is_trusted_source;
use crate::core::http::APP_USER_AGENT;

/// Bytes written (and progress-checked) per step.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Resumable downloader with bounded retry and trusted-host TLS fallback.
///
/// Cheap to share behind an `Arc`; the transports inside carry the
/// connection pools.
pub struct Downloader {
    transports: TransportPool,
    policy: RetryPolicy,
}

impl Downloader {
    pub fn new(transports: TransportPool) -> Self {
        Self {
            transports,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // ── Retry loop ──────────────────────────────────────

    /// Download `request.url` to `request.destination`.
    ///
    /// The destination is only ever written by renaming a complete temp
    /// file onto it. Failed attempts leave `{destination}.tmp` behind so the
    /// next attempt (or the next call) resumes with a range request.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<(), DownloadError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let trusted = is_trusted_source(&request.url);
        let mut insecure_used = false;
        let mut attempt = 1;

        loop {
            let failure = match self.attempt(self.transports.verified(), request).await {
                Ok(()) => return Ok(()),
                Err(AttemptError::Cancelled) => return Err(cancelled(request)),
                Err(e) => e,
            };

            warn!(
                "Download attempt {}/{} for {} failed: {}",
                attempt, max_attempts, request.url, failure
            );

            let failure = if failure.is_tls_verification() && trusted && !insecure_used {
                insecure_used = true;
                warn!(
                    "Certificate verification failed for trusted host, retrying {} without verification",
                    request.url
                );
                match self.attempt(self.transports.insecure(), request).await {
                    Ok(()) => {
                        info!("Download of {} succeeded without certificate verification", request.url);
                        return Ok(());
                    }
                    Err(AttemptError::Cancelled) => return Err(cancelled(request)),
                    Err(e) => {
                        warn!("Unverified retry for {} failed: {}", request.url, e);
                        e
                    }
                }
            } else {
                failure
            };

            if attempt >= max_attempts {
                return Err(DownloadError::Exhausted {
                    url: request.url.clone(),
                    attempts: max_attempts,
                    last: failure,
                });
            }

            if let Some(token) = &request.cancellation {
                tokio::select! {
                    _ = token.cancelled() => return Err(cancelled(request)),
                    _ = tokio::time::sleep(self.policy.retry_delay) => {}
                }
            } else {
                tokio::time::sleep(self.policy.retry_delay).await;
            }
            attempt += 1;
        }
    }

    // ── Single attempt ──────────────────────────────────

    /// One attempt bounded by the policy deadline and the request's
    /// cancellation token.
    async fn attempt(
        &self,
        transport: &dyn Transport,
        request: &TransferRequest,
    ) -> Result<(), AttemptError> {
        let timeout = self.policy.attempt_timeout;
        let bounded = async {
            match tokio::time::timeout(timeout, attempt_transfer(transport, request)).await {
                Ok(result) => result,
                Err(_) => Err(AttemptError::TimedOut(timeout)),
            }
        };

        match &request.cancellation {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(AttemptError::Cancelled),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }
}

fn cancelled(request: &TransferRequest) -> DownloadError {
    info!("Download of {} cancelled", request.url);
    DownloadError::Cancelled {
        url: request.url.clone(),
    }
}

/// Resumable GET into `{destination}.tmp`, renamed on completion.
async fn attempt_transfer(
    transport: &dyn Transport,
    request: &TransferRequest,
) -> Result<(), AttemptError> {
    let destination = request.destination.as_path();
    let temp_path = request.temp_path();

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AttemptError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let resume_from = tokio::fs::metadata(&temp_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    Url::parse(&request.url).map_err(|e| AttemptError::InvalidUrl {
        url: request.url.clone(),
        reason: e.to_string(),
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers.insert(USER_AGENT, HeaderValue::from_static(APP_USER_AGENT));
    if resume_from > 0 {
        if let Ok(range) = HeaderValue::from_str(&format!("bytes={resume_from}-")) {
            headers.insert(RANGE, range);
        }
    }

    let response = transport.get(&request.url, headers).await?;

    let mut options = OpenOptions::new();
    // The offset must be settled before the total is computed, otherwise a
    // 200 after a range request inflates the denominator.
    let offset = match response.status {
        206 => {
            options.create(true).append(true);
            resume_from
        }
        200 => {
            if resume_from > 0 {
                warn!(
                    "Server ignored range request for {} (had {} bytes), restarting from zero",
                    request.url, resume_from
                );
            }
            options.create(true).write(true).truncate(true);
            0
        }
        416 if resume_from > 0 => {
            warn!(
                "Range {}- not satisfiable for {}, discarding partial file",
                resume_from, request.url
            );
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                warn!("Could not remove partial file {:?}: {}", temp_path, e);
            }
            return Err(AttemptError::UnexpectedStatus { status: 416 });
        }
        status => return Err(AttemptError::UnexpectedStatus { status }),
    };

    let total = response.content_length.map(|len| len + offset);

    let mut file = options
        .open(&temp_path)
        .await
        .map_err(|source| io_error(&temp_path, source))?;

    let mut tracker = ProgressTracker::new(
        request.on_progress.as_ref(),
        &request.stage,
        request.progress_weight,
        request.file_name(),
        total,
        offset,
        Instant::now(),
    );

    let mut body = response.body;
    let mut downloaded = offset;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(CHUNK_SIZE) {
            file.write_all(piece)
                .await
                .map_err(|source| io_error(&temp_path, source))?;
            downloaded += piece.len() as u64;
            tracker.record(downloaded, Instant::now());
        }
    }

    file.flush()
        .await
        .map_err(|source| io_error(&temp_path, source))?;
    drop(file);

    if let Some(expected) = total {
        if downloaded < expected {
            return Err(AttemptError::Truncated {
                expected,
                received: downloaded,
            });
        }
    }

    tracker.finish(downloaded, Instant::now());

    tokio::fs::rename(&temp_path, destination)
        .await
        .map_err(|source| io_error(destination, source))?;

    debug!("Downloaded: {} -> {:?} ({} bytes)", request.url, destination, downloaded);
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> AttemptError {
    AttemptError::Io {
        path: path.to_path_buf(),
        source,
    }
}
