// crates/research-providers/src/builtin.rs
// ============================================================================
// Module: Built-in Providers
// Description: Concrete Provider implementations shipped with the agent.
// Purpose: Give the registry real providers to dispatch to out of the box:
//          a general web-search adapter and a statistical-agency adapter.
// Dependencies: research_core::Provider, crate::http, crate::env
// ============================================================================

//! ## Overview
//! Both providers here share one shape: a JSON search endpoint, an API key
//! looked up lazily via [`crate::env::lookup_api_key`], and a response
//! parsed into [`ProviderHit`]s. A missing key is not an error; [`Provider::query`]
//! returns [`ProviderError::NotConfigured`] and the caller moves on.

use async_trait::async_trait;
use research_core::Provider;
use research_core::ProviderError;
use research_core::ProviderHit;
use research_core::ProviderKind;
use research_core::ProviderQuery;
use serde::Deserialize;

use crate::env::lookup_api_key;
use crate::http::HttpFetchConfig;
use crate::http::fetch_pinned;

/// One normalized result entry shared by the built-in providers' JSON
/// response shape.
#[derive(Debug, Deserialize)]
struct SearchResultItem {
    /// Result title.
    title: String,
    /// Result URL.
    url: String,
    /// Result snippet, possibly absent.
    #[serde(default)]
    snippet: String,
    /// ISO-8601 publication date, if present.
    #[serde(default)]
    published_at: Option<String>,
    /// DOI, if present (academic/statistical endpoints only).
    #[serde(default)]
    doi: Option<String>,
    /// Provider-native relevance score, if present.
    #[serde(default)]
    score: Option<f64>,
}

/// The envelope every built-in provider's JSON endpoint is expected to
/// return.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Result items.
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

/// A generic JSON search-endpoint provider, parameterized by name, base
/// URL, and the environment variable holding its API key.
pub struct JsonSearchProvider {
    /// Stable provider name.
    name: &'static str,
    /// Provider classification.
    kind: ProviderKind,
    /// Base URL of the search endpoint, including scheme and host.
    base_url: String,
    /// Environment variable holding this provider's API key.
    api_key_env: &'static str,
    /// Fetch hardening configuration.
    fetch_config: HttpFetchConfig,
}

impl JsonSearchProvider {
    /// Builds a general web-search provider.
    #[must_use]
    pub fn web_search(base_url: impl Into<String>, fetch_config: HttpFetchConfig) -> Self {
        Self {
            name: "web-search",
            kind: ProviderKind::Search,
            base_url: base_url.into(),
            api_key_env: "RA_WEB_SEARCH_API_KEY",
            fetch_config,
        }
    }

    /// Builds a statistical-agency vertical provider.
    #[must_use]
    pub fn statistical_agency(base_url: impl Into<String>, fetch_config: HttpFetchConfig) -> Self {
        Self {
            name: "statistical-agency",
            kind: ProviderKind::Vertical,
            base_url: base_url.into(),
            api_key_env: "RA_STATS_AGENCY_API_KEY",
            fetch_config,
        }
    }

    /// Builds the full request URL for `query`.
    fn request_url(&self, query: &ProviderQuery, api_key: &str) -> String {
        let encoded_query = urlencode(&query.text);
        format!(
            "{}/search?q={encoded_query}&limit={}&key={}",
            self.base_url.trim_end_matches('/'),
            query.max_results,
            urlencode(api_key)
        )
    }
}

#[async_trait]
impl Provider for JsonSearchProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn query(&self, query: &ProviderQuery) -> Result<Vec<ProviderHit>, ProviderError> {
        let Some(api_key) = lookup_api_key(self.api_key_env) else {
            return Err(ProviderError::NotConfigured);
        };

        let url = self.request_url(query, &api_key);
        let body = fetch_pinned(&url, &self.fetch_config)
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|item| ProviderHit {
                title: item.title,
                url: item.url,
                snippet: item.snippet,
                published_at: item.published_at,
                doi: item.doi,
                raw_score: item.score,
            })
            .collect())
    }
}

/// Percent-encodes `value` for safe inclusion in a query string, without
/// pulling in a full URL-encoding crate dependency for this one use.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use research_core::Intent;

    use super::*;

    #[test]
    fn urlencode_escapes_spaces_and_symbols() {
        assert_eq!(urlencode("a b&c"), "a%20b%26c");
        assert_eq!(urlencode("tariffs & trade"), "tariffs%20%26%20trade");
    }

    #[test]
    fn missing_api_key_yields_not_configured() {
        assert_eq!(lookup_api_key("RA_WEB_SEARCH_API_KEY_TEST_ONLY_UNSET"), None);
    }

    #[tokio::test]
    async fn query_without_key_returns_not_configured_error() {
        let provider = JsonSearchProvider {
            name: "web-search",
            kind: ProviderKind::Search,
            base_url: "https://example.com".to_string(),
            api_key_env: "RA_DEFINITELY_UNSET_TEST_KEY_ABC",
            fetch_config: HttpFetchConfig::default(),
        };
        let query = ProviderQuery {
            text: "test".to_string(),
            max_results: 5,
            intent: Intent::Generic,
            subtopic_name: None,
        };
        let result = provider.query(&query).await;
        assert!(matches!(result, Err(ProviderError::NotConfigured)));
    }
}
