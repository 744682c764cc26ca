use reqwest::Url;

/// Hosts whose downloads may be retried without certificate verification
/// after a verified attempt was rejected. Subdomains match too.
pub const TRUSTED_HOSTS: &[&str] = &[
    "github.com",
    "githubusercontent.com",
    "adoptium.net",
    "itch.zone",
];

/// Match `host` against [`TRUSTED_HOSTS`], either exactly or as a
/// dot-separated suffix. The comparison is case-sensitive; hosts coming
/// through [`is_trusted_source`] are already lowercased by URL parsing.
pub fn is_trusted_host(host: &str) -> bool {
    TRUSTED_HOSTS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Whether the host of `url` is trusted. Unparsable URLs never are.
/// The host is normalised to lowercase first, so `GitHub.com` matches.
pub fn is_trusted_source(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(is_trusted_host))
        .unwrap_or(false)
}
