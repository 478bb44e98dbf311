// crates/research-providers/src/http.rs
// ============================================================================
// Module: Provider HTTP Fetch
// Description: A DNS-pinned, size-capped async HTTP helper for provider
//              adapters.
// Purpose: Give every provider and the enrichment stage one hardened fetch
//          path instead of each calling reqwest directly.
// Dependencies: reqwest, url, tokio
// ============================================================================

//! ## Overview
//! Provider responses and enrichment fetches both pull from third-party
//! hosts over the open internet; this module resolves the target host once,
//! rejects private/link-local addresses, pins the request to the resolved
//! IP (so a slow DNS response can't be swapped out from under the request),
//! and caps how many bytes of body it will read.

use std::net::IpAddr;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration for a single pinned HTTP fetch.
#[derive(Debug, Clone)]
pub struct HttpFetchConfig {
    /// Hosts this fetch is permitted to contact; empty means unrestricted.
    pub allowed_hosts: Vec<String>,
    /// Whether private/link-local resolved addresses are permitted.
    pub allow_private_networks: bool,
    /// Maximum response bytes read before the fetch is aborted.
    pub max_response_bytes: u64,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header value sent with every request.
    pub user_agent: String,
}

impl Default for HttpFetchConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            allow_private_networks: false,
            max_response_bytes: 2_000_000,
            timeout: Duration::from_secs(10),
            user_agent: "research-agent/0.1".to_string(),
        }
    }
}

/// Failures a pinned fetch can report.
#[derive(Debug, Error)]
pub enum HttpFetchError {
    /// The URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The target host is not on the allowlist.
    #[error("host not allowed: {0}")]
    HostNotAllowed(String),
    /// DNS resolution failed or returned no usable address.
    #[error("dns resolution failed for {0}")]
    DnsResolution(String),
    /// The resolved address is private or link-local and
    /// `allow_private_networks` is false.
    #[error("resolved address for {0} is private or link-local")]
    PrivateNetworkBlocked(String),
    /// The response body exceeded `max_response_bytes`.
    #[error("response exceeded {0} byte limit")]
    ResponseTooLarge(u64),
    /// A transport-level failure occurred.
    #[error("transport error: {0}")]
    Transport(String),
}

/// True when `addr` is private, loopback, or link-local.
#[must_use]
pub fn is_private_or_link_local(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_broadcast() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

/// Resolves `host`, validates it against `config`, and returns the first
/// acceptable socket address.
///
/// # Errors
/// Returns [`HttpFetchError::HostNotAllowed`],
/// [`HttpFetchError::DnsResolution`], or
/// [`HttpFetchError::PrivateNetworkBlocked`] as appropriate.
pub async fn resolve_and_validate_host(
    host: &str,
    port: u16,
    config: &HttpFetchConfig,
) -> Result<SocketAddr, HttpFetchError> {
    if !config.allowed_hosts.is_empty() && !config.allowed_hosts.iter().any(|h| h == host) {
        return Err(HttpFetchError::HostNotAllowed(host.to_string()));
    }

    let lookup_target = format!("{host}:{port}");
    let mut addrs = tokio::net::lookup_host(&lookup_target)
        .await
        .map_err(|e| HttpFetchError::DnsResolution(format!("{host}: {e}")))?;

    let first = addrs
        .next()
        .ok_or_else(|| HttpFetchError::DnsResolution(host.to_string()))?;

    if !config.allow_private_networks && is_private_or_link_local(first.ip()) {
        return Err(HttpFetchError::PrivateNetworkBlocked(host.to_string()));
    }

    Ok(first)
}

/// Fetches `url`, pinning DNS resolution and capping response size per
/// `config`.
///
/// # Errors
/// Returns [`HttpFetchError`] for any validation, resolution, or transport
/// failure.
pub async fn fetch_pinned(url: &str, config: &HttpFetchConfig) -> Result<Vec<u8>, HttpFetchError> {
    let parsed = Url::parse(url).map_err(|e| HttpFetchError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| HttpFetchError::InvalidUrl("missing host".to_string()))?
        .to_string();
    let port = parsed.port_or_known_default().unwrap_or(443);

    let resolved = resolve_and_validate_host(&host, port, config).await?;

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .resolve(&host, resolved)
        .build()
        .map_err(|e| HttpFetchError::Transport(e.to_string()))?;

    let response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| HttpFetchError::Transport(e.to_string()))?;

    read_response_limited(response, config.max_response_bytes).await
}

/// Follows redirects from `url` and returns the final landing URL, without
/// reading the response body. Used to resolve DOI links to their publisher
/// page so `doi.org` never dominates domain caps or triangulation.
///
/// # Errors
/// Returns [`HttpFetchError`] for any validation, resolution, or transport
/// failure.
pub async fn resolve_final_url(url: &str, config: &HttpFetchConfig) -> Result<String, HttpFetchError> {
    let parsed = Url::parse(url).map_err(|e| HttpFetchError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| HttpFetchError::InvalidUrl("missing host".to_string()))?
        .to_string();
    let port = parsed.port_or_known_default().unwrap_or(443);

    resolve_and_validate_host(&host, port, config).await?;

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| HttpFetchError::Transport(e.to_string()))?;

    let response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| HttpFetchError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(HttpFetchError::Transport(format!("status {}", response.status())));
    }

    Ok(response.url().to_string())
}

/// Drains `response`'s body into memory, aborting once `max_bytes` is
/// exceeded.
///
/// # Errors
/// Returns [`HttpFetchError::ResponseTooLarge`] or
/// [`HttpFetchError::Transport`].
async fn read_response_limited(mut response: reqwest::Response, max_bytes: u64) -> Result<Vec<u8>, HttpFetchError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| HttpFetchError::Transport(e.to_string()))?
    {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "max_bytes is a small configured ceiling, never close to usize::MAX"
        )]
        if buffer.len() + chunk.len() > max_bytes as usize {
            return Err(HttpFetchError::ResponseTooLarge(max_bytes));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    #[test]
    fn loopback_and_private_ranges_are_blocked() {
        assert!(is_private_or_link_local("127.0.0.1".parse().expect("valid ip")));
        assert!(is_private_or_link_local("10.0.0.1".parse().expect("valid ip")));
        assert!(is_private_or_link_local("169.254.1.1".parse().expect("valid ip")));
        assert!(is_private_or_link_local("192.168.1.1".parse().expect("valid ip")));
    }

    #[test]
    fn public_address_is_not_blocked() {
        assert!(!is_private_or_link_local("93.184.216.34".parse().expect("valid ip")));
    }

    #[tokio::test]
    async fn disallowed_host_is_rejected_before_dns() {
        let config = HttpFetchConfig {
            allowed_hosts: vec!["example.com".to_string()],
            ..HttpFetchConfig::default()
        };
        let result = resolve_and_validate_host("evil.example.net", 443, &config).await;
        assert!(matches!(result, Err(HttpFetchError::HostNotAllowed(_))));
    }
}
