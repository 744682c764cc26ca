use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::progress::{ProgressCallback, ProgressEvent};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Suffix of the in-flight working file next to the destination.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Retry bounds for one transfer. Fixed delay, no backoff growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Deadline for one attempt, connection and body included.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// `{destination}.tmp`
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// One file to fetch.
#[derive(Clone)]
pub struct TransferRequest {
    pub destination: PathBuf,
    pub url: String,
    /// Opaque phase label forwarded to progress callbacks.
    pub stage: String,
    /// Share of a larger progress bar this transfer represents.
    pub progress_weight: f64,
    pub on_progress: Option<ProgressCallback>,
    pub cancellation: Option<CancellationToken>,
}

impl TransferRequest {
    pub fn new(destination: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            url: url.into(),
            stage: "download".to_string(),
            progress_weight: 1.0,
            on_progress: None,
            cancellation: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.progress_weight = weight;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.on_progress = Some(std::sync::Arc::new(callback));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn temp_path(&self) -> PathBuf {
        temp_path_for(&self.destination)
    }

    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRequest")
            .field("destination", &self.destination)
            .field("url", &self.url)
            .field("stage", &self.stage)
            .field("progress_weight", &self.progress_weight)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/games/latest/client.zip")),
            PathBuf::from("/games/latest/client.zip.tmp")
        );
    }

    #[test]
    fn request_defaults() {
        let req = TransferRequest::new("/tmp/x/game.pwr", "https://example.com/game.pwr");
        assert_eq!(req.stage, "download");
        assert_eq!(req.progress_weight, 1.0);
        assert_eq!(req.file_name(), "game.pwr");
        assert!(req.on_progress.is_none());
        assert_eq!(RetryPolicy::default().max_attempts, 3);
        assert_eq!(RetryPolicy::default().retry_delay, Duration::from_secs(2));
    }
}
