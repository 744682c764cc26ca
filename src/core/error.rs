use std::path::PathBuf;
use thiserror::Error;

use crate::core::downloader::DownloadError;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error(transparent)]
    Download(#[from] DownloadError),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-256 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha256Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── News ────────────────────────────────────────────
    #[error("Invalid publish date {value:?} on post {slug:?}")]
    InvalidNewsDate { slug: String, value: String },

    // ── Updates ─────────────────────────────────────────
    #[error("No launcher download found for {os}/{arch}")]
    NoUpdateAsset { os: String, arch: String },

    // ── Instance ────────────────────────────────────────
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Invalid instance name: {0}")]
    InvalidInstanceName(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// Front ends get a flat message, never the nested source chain.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_flat_message() {
        let err = LauncherError::NoUpdateAsset {
            os: "linux".into(),
            arch: "riscv64".into(),
        };
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#""No launcher download found for linux/riscv64""#
        );
    }

    #[test]
    fn bare_io_errors_carry_empty_path() {
        let err: LauncherError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, LauncherError::Io { ref path, .. } if path.as_os_str().is_empty()));
    }
}
