use std::path::PathBuf;
use std::time::Duration;

use super::transport::TransportError;

/// Why a single attempt failed. Only ever logged; callers see
/// [`DownloadError`].
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected status code: {status}")]
    UnexpectedStatus { status: u16 },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stream ended after {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },
    #[error("attempt exceeded {0:?}")]
    TimedOut(Duration),
    #[error("cancelled")]
    Cancelled,
}

impl AttemptError {
    pub fn is_tls_verification(&self) -> bool {
        matches!(
            self,
            AttemptError::Transport(TransportError::TlsVerification(_))
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download of {url} failed after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: AttemptError,
    },
    #[error("download of {url} was cancelled")]
    Cancelled { url: String },
}
