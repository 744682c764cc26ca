use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

pub const APP_USER_AGENT: &str = "HyPrism/1.0";

/// Upper bound for a whole request, body included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Whether a client checks the server certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertVerification {
    Verified,
    /// Only ever used for the trusted-host fallback in the downloader.
    Disabled,
}

/// Build a long-lived client with keep-alive pooling, TLS 1.2+ and no
/// content compression (byte ranges must map 1:1 onto the file on disk).
///
/// Clones share the same connection pool, so the composition root builds
/// one client per verification mode and hands out clones.
pub fn build_http_client(verification: CertVerification) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .danger_accept_invalid_certs(verification == CertVerification::Disabled)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_both_verification_modes() {
        assert!(build_http_client(CertVerification::Verified).is_ok());
        assert!(build_http_client(CertVerification::Disabled).is_ok());
    }
}
