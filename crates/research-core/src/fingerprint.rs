// crates/research-core/src/fingerprint.rs
// ============================================================================
// Module: Canonical Identifiers
// Description: URL canonicalization and deterministic fingerprinting.
// Purpose: Give the deduper and triangulator a stable identity per source,
//          independent of tracking parameters or URL casing quirks.
// Dependencies: sha2, serde
// ============================================================================

//! ## Overview
//! Two records that differ only by `utm_*` noise or a trailing slash must
//! collapse to the same [`CanonicalId`]. When a DOI is available it wins
//! outright (two mirrors of the same paper share a DOI but rarely share a
//! URL); otherwise the id is a fingerprint of the canonicalized URL.
//!
//! Invariants:
//! - [`canonicalize_url`] is idempotent: canonicalizing a canonicalized URL
//!   is a no-op.
//! - [`CanonicalId`] is deterministic: same input always yields the same id.

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Query parameters stripped during canonicalization because they encode
/// tracking/session state rather than resource identity.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "ref",
    "referer",
    "referrer",
    "sessionid",
    "sid",
    "ssid",
    "s",
    "source",
    "versionid",
    "v",
    "t",
    "timestamp",
];

/// A deterministic, deduplication-ready identifier for a piece of evidence.
///
/// # Invariants
/// - [`Self::Doi`] is preferred over [`Self::UrlFingerprint`] whenever a DOI
///   is available, since mirrors of the same work rarely share a URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalId {
    /// Identity derived from a normalized DOI string.
    Doi(String),
    /// Identity derived from a 16-hex-digit fingerprint of the canonical URL.
    UrlFingerprint(String),
}

impl CanonicalId {
    /// Builds the canonical id for a record, preferring `doi` when present.
    #[must_use]
    pub fn new(canonical_url: &str, doi: Option<&str>) -> Self {
        match doi.map(normalize_doi) {
            Some(doi) if !doi.is_empty() => Self::Doi(doi),
            _ => Self::UrlFingerprint(fingerprint_url(canonical_url)),
        }
    }

    /// Returns the id as an opaque string, suitable for use as a map key.
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::Doi(doi) => format!("doi:{doi}"),
            Self::UrlFingerprint(fp) => format!("url:{fp}"),
        }
    }
}

/// Lowercases and trims a DOI, stripping a leading `https://doi.org/` host
/// prefix when present.
fn normalize_doi(doi: &str) -> String {
    let trimmed = doi.trim();
    let stripped = trimmed
        .strip_prefix("https://doi.org/")
        .or_else(|| trimmed.strip_prefix("http://doi.org/"))
        .or_else(|| trimmed.strip_prefix("doi:"))
        .unwrap_or(trimmed);
    stripped.to_ascii_lowercase()
}

/// Strips tracking query parameters, sorts the remainder, drops the
/// fragment, and removes a trailing slash from URLs with enough path
/// segments to make one meaningless.
///
/// # Invariants
/// - Idempotent: `canonicalize_url(&canonicalize_url(u)) == canonicalize_url(u)`.
#[must_use]
pub fn canonicalize_url(raw: &str) -> String {
    let without_fragment = raw.split('#').next().unwrap_or(raw);
    let (base, query) = match without_fragment.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (without_fragment, None),
    };

    let mut kept: Vec<(String, String)> = Vec::new();
    if let Some(query) = query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key_lower = key.to_ascii_lowercase();
            if TRACKING_PARAMS.contains(&key_lower.as_str()) {
                continue;
            }
            kept.push((key.to_string(), value.to_string()));
        }
    }
    kept.sort();

    let mut result = base.to_string();
    if !kept.is_empty() {
        let rebuilt = kept
            .into_iter()
            .map(|(k, v)| if v.is_empty() { k } else { format!("{k}={v}") })
            .collect::<Vec<_>>()
            .join("&");
        result.push('?');
        result.push_str(&rebuilt);
    }

    if result.ends_with('/') && result.matches('/').count() > 3 {
        result.pop();
    }
    result
}

/// Fingerprints a canonical URL to a stable 16-hex-digit identifier.
#[must_use]
pub fn fingerprint_url(canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tracking_params_and_sorts_remainder() {
        let url = "https://example.com/a/b/c?utm_source=x&z=1&a=2";
        assert_eq!(canonicalize_url(url), "https://example.com/a/b/c?a=2&z=1");
    }

    #[test]
    fn strips_fragment_and_trailing_slash() {
        let url = "https://example.com/a/b/c/#section";
        assert_eq!(canonicalize_url(url), "https://example.com/a/b/c");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let url = "https://example.com/a/b/c/?utm_source=x&z=1#frag";
        let once = canonicalize_url(url);
        let twice = canonicalize_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn doi_takes_precedence_over_url_fingerprint() {
        let id = CanonicalId::new("https://example.com/paper", Some("https://doi.org/10.1/ABC"));
        assert_eq!(id, CanonicalId::Doi("10.1/abc".to_string()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint_url("https://example.com/x");
        let b = fingerprint_url("https://example.com/x");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }
}
