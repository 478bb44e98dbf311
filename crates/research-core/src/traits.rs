// crates/research-core/src/traits.rs
// ============================================================================
// Module: Capability Traits
// Description: The Provider and SimilarityOracle contracts implementations
//              plug into.
// Purpose: Decouple research-pipeline and research-dispatch from concrete
//          provider/similarity implementations living in research-providers.
// Dependencies: async-trait, thiserror, crate::intent
// ============================================================================

//! ## Overview
//! [`Provider`] is the one capability every evidence source implements,
//! whether it is a general web-search API or a statistical-agency client.
//! [`SimilarityOracle`] is the (synchronous, cheap) capability the deduper
//! uses to compare titles without depending on a specific similarity
//! algorithm.

use async_trait::async_trait;
use thiserror::Error;

use crate::intent::Intent;

/// Coarse classification of a provider, used by the registry to decide
/// dispatch grouping and by the domain balancer to weight results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProviderKind {
    /// A general-purpose web search API.
    Search,
    /// A curated vertical or official-source API.
    Vertical,
}

/// A single query dispatched to a provider.
#[derive(Debug, Clone)]
pub struct ProviderQuery {
    /// The query text, already planned/expanded by the query planner.
    pub text: String,
    /// Maximum number of hits the provider should return.
    pub max_results: usize,
    /// Intent of the topic this query serves, for providers that can
    /// restrict themselves to primary sources.
    pub intent: Intent,
    /// Optional subtopic/facet name, carried through to evidence records.
    pub subtopic_name: Option<String>,
}

/// One raw result returned by a provider, before normalization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderHit {
    /// Page or record title.
    pub title: String,
    /// Result URL as returned by the provider.
    pub url: String,
    /// Snippet or abstract text, possibly empty.
    pub snippet: String,
    /// ISO-8601 publication date, if the provider supplies one.
    pub published_at: Option<String>,
    /// DOI, if the provider supplies one (typically academic indexes).
    pub doi: Option<String>,
    /// Provider-native relevance score, if any, not yet normalized to
    /// `[0.0, 1.0]`.
    pub raw_score: Option<f64>,
}

/// Failure modes a provider call can report.
///
/// # Invariants
/// - [`Self::RateLimited`] and [`Self::Unavailable`] are the only variants
///   the circuit breaker reacts to; all others are treated as a plain
///   failed call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is missing required configuration (e.g. no API key);
    /// callers should skip it silently rather than surface an error.
    #[error("provider not configured")]
    NotConfigured,
    /// The provider rejected the call with a rate-limit response.
    #[error("provider rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited {
        /// Milliseconds the provider suggested waiting before retry, if any.
        retry_after_ms: Option<u64>,
    },
    /// The provider's circuit breaker has tripped and calls are suppressed.
    #[error("provider circuit open")]
    Unavailable,
    /// The provider returned a response that failed to parse.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    /// A network-level failure occurred reaching the provider.
    #[error("network error: {0}")]
    Network(String),
}

/// A source of evidence hits for a planned query.
///
/// # Invariants
/// - Implementations never panic on malformed upstream responses; they
///   return [`ProviderError::InvalidResponse`] instead.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name, used as the registry key and in logs.
    fn name(&self) -> &str;

    /// Coarse classification used for dispatch grouping.
    fn kind(&self) -> ProviderKind;

    /// Executes `query` against this provider, returning raw hits.
    ///
    /// # Errors
    /// Returns [`ProviderError`] for configuration, rate-limit, circuit,
    /// parse, or network failures. Callers must not treat any variant as
    /// fatal to the overall run.
    async fn query(&self, query: &ProviderQuery) -> Result<Vec<ProviderHit>, ProviderError>;
}

/// A batch text-embedding capability used by the deduper and triangulator.
///
/// Implementations need only provide [`Self::encode`]; pairwise similarity
/// is derived from it via [`cosine`]. When no real embedding model is
/// wired in, a deterministic lexical fallback (bag-of-words overlap) keeps
/// the pipeline functional.
pub trait SimilarityOracle: Send + Sync {
    /// Encodes a batch of texts into one vector per input, in order.
    fn encode(&self, texts: &[String]) -> Vec<Vec<f64>>;

    /// Convenience wrapper: encodes exactly `a` and `b` and returns their
    /// cosine similarity in `[0.0, 1.0]`.
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let vectors = self.encode(&[a.to_string(), b.to_string()]);
        cosine(&vectors[0], &vectors[1])
    }
}

/// Cosine similarity between two vectors, clamped to `[0.0, 1.0]` (embedding
/// and bag-of-words vectors here are never negative, so the natural range
/// already excludes negative cosine, but floating-point error can push
/// slightly outside it).
#[must_use]
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}
