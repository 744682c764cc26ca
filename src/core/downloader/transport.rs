//! HTTP transport seam for the downloader.
//!
//! The engine only needs "GET this URL with these headers and give me a
//! status, a length and a body stream". Keeping that behind a trait lets the
//! retry/resume state machine run against a scripted transport in tests,
//! and pins certificate-failure detection to the one place where the
//! underlying TLS error is still a typed value.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::Client;

use crate::core::http::{build_http_client, CertVerification};

pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Transport-level failure, classified where it happens.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("certificate verification failed: {0}")]
    TlsVerification(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if is_certificate_failure(&err) {
            TransportError::TlsVerification(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Walk the error chain looking for a rustls certificate rejection.
///
/// `io::Error` hides its payload from `source()`, so wrapped IO errors are
/// unpacked through `get_ref()` as well.
fn is_certificate_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(tls) = err.downcast_ref::<rustls::Error>() {
            if matches!(
                tls,
                rustls::Error::InvalidCertificate(_) | rustls::Error::NoCertificatesPresented
            ) {
                return true;
            }
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if let Some(inner) = io.get_ref() {
                if is_certificate_failure(inner) {
                    return true;
                }
            }
        }
        current = err.source();
    }
    false
}

pub struct TransportResponse {
    pub status: u16,
    /// Length of the body as announced by the server, if any.
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url).headers(headers).send().await?;

        Ok(TransportResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map_err(TransportError::from))
                .boxed(),
        })
    }
}

/// The two process-wide transports: certificate-verified, and the
/// unverified one reserved for trusted-host fallback.
#[derive(Clone)]
pub struct TransportPool {
    verified: Arc<dyn Transport>,
    insecure: Arc<dyn Transport>,
}

impl TransportPool {
    pub fn new(verified: Arc<dyn Transport>, insecure: Arc<dyn Transport>) -> Self {
        Self { verified, insecure }
    }

    /// Wrap already-built clients (the verified one is usually shared with
    /// other HTTP callers so they reuse its connections).
    pub fn from_clients(verified: Client, insecure: Client) -> Self {
        Self::new(
            Arc::new(ReqwestTransport::new(verified)),
            Arc::new(ReqwestTransport::new(insecure)),
        )
    }

    pub fn build() -> Result<Self, reqwest::Error> {
        Ok(Self::from_clients(
            build_http_client(CertVerification::Verified)?,
            build_http_client(CertVerification::Disabled)?,
        ))
    }

    pub fn verified(&self) -> &dyn Transport {
        self.verified.as_ref()
    }

    pub fn insecure(&self) -> &dyn Transport {
        self.insecure.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapper(std::io::Error);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "client error (Connect)")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn detects_certificate_rejection_inside_io_error() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let err = Wrapper(std::io::Error::new(std::io::ErrorKind::InvalidData, tls));
        assert!(is_certificate_failure(&err));
    }

    #[test]
    fn ignores_other_tls_and_io_failures() {
        let tls = rustls::Error::DecryptError;
        let err = Wrapper(std::io::Error::new(std::io::ErrorKind::InvalidData, tls));
        assert!(!is_certificate_failure(&err));

        let refused = Wrapper(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "certificate x509 tls",
        ));
        assert!(!is_certificate_failure(&refused));
    }

    #[test]
    fn pool_builds_from_default_clients() {
        assert!(TransportPool::build().is_ok());
    }
}
