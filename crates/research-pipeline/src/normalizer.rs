// crates/research-pipeline/src/normalizer.rs
// ============================================================================
// Module: Normalizer
// Description: Converts raw provider hits into well-formed Evidence records.
// Purpose: Be the one place a malformed or sparse provider response is
//          repaired or rejected, so every later stage can trust the
//          Evidence invariants hold.
// Dependencies: research_core::{Evidence, ProviderHit, CanonicalId,
//               canonicalize_url}
// ============================================================================

//! ## Overview
//! A provider hit becomes an [`Evidence`] record here. Snippet synthesis is
//! a four-step fallback chain, so a hit is never dropped purely for lack of
//! text: (a) the provider's own snippet/quote text, if non-empty; (b)
//! otherwise the title, prefixed `"Content: "` and truncated to 280
//! characters; (c) otherwise `"Source content from <domain>"`; (d)
//! otherwise the fixed string `"Content available at source"`. A hit is
//! only dropped when its URL fails to canonicalize into a usable domain,
//! since every other field can fall back to something, but `source_domain`
//! cannot.

use research_core::CanonicalId;
use research_core::Evidence;
use research_core::ProviderHit;
use research_core::ProviderTag;
use research_core::Stance;
use research_core::canonicalize_url;

use crate::domain_balance::family_for_domain;

/// Maximum snippet length, in characters, carried into an Evidence record.
const MAX_SNIPPET_CHARS: usize = 500;

/// Maximum length of the title-derived synthesized snippet (step b of the
/// fallback chain).
const MAX_TITLE_SNIPPET_CHARS: usize = 280;

/// Synthesizes a non-empty snippet from `title`/`raw_snippet`/`domain`,
/// following the four-step fallback chain.
fn synthesize_snippet(raw_snippet: &str, title: &str, domain: &str) -> String {
    let trimmed_snippet = raw_snippet.trim();
    if !trimmed_snippet.is_empty() {
        return trimmed_snippet.chars().take(MAX_SNIPPET_CHARS).collect();
    }
    if !title.is_empty() {
        let body: String = format!("Content: {title}").chars().take(MAX_TITLE_SNIPPET_CHARS).collect();
        return body;
    }
    if !domain.is_empty() {
        return format!("Source content from {domain}");
    }
    "Content available at source".to_string()
}

/// Monotonic id allocator for evidence records within one run.
pub struct IdAllocator {
    /// Next id to hand out.
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocates the next evidence id, formatted as `ev-000001` style.
    pub fn next_id(&mut self) -> String {
        let id = format!("ev-{:06}", self.next);
        self.next += 1;
        id
    }
}

/// Normalizes one raw [`ProviderHit`] into an [`Evidence`] record.
///
/// Returns `None` when the hit has no usable title or snippet text.
///
/// # Invariants
/// - The returned record always satisfies [`Evidence::has_valid_snippet`].
#[must_use]
pub fn normalize(
    provider: ProviderTag,
    hit: ProviderHit,
    subtopic_name: Option<String>,
    ids: &mut IdAllocator,
    collected_at: &str,
) -> Option<Evidence> {
    let title = hit.title.trim().to_string();

    let canonical_url = canonicalize_url(&hit.url);
    let source_domain = extract_domain(&canonical_url).unwrap_or_default();
    if source_domain.is_empty() {
        return None;
    }
    let canonical_id = CanonicalId::new(&canonical_url, hit.doi.as_deref());

    let snippet = synthesize_snippet(&hit.snippet, &title, &source_domain);

    let relevance_score = hit.raw_score.map_or(0.5, |s| s.clamp(0.0, 1.0));

    Some(Evidence {
        id: ids.next_id(),
        canonical_id,
        provider,
        url: hit.url,
        canonical_url,
        source_domain: source_domain.clone(),
        title,
        snippet,
        best_quote: None,
        publication_date: hit.published_at,
        collected_at: collected_at.to_string(),
        credibility_score: 0.5,
        relevance_score,
        confidence: relevance_score,
        is_primary_source: false,
        is_triangulated: false,
        cluster_id: None,
        family: family_for_domain(&source_domain),
        controversy_score: 0.0,
        stance: Stance::Neutral,
        disputed_by: std::collections::BTreeSet::new(),
        claim: None,
        supporting_text: None,
        subtopic_name,
    })
}

/// Extracts a lowercased, `www.`-stripped registrable domain from a URL.
fn extract_domain(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    fn sample_hit() -> ProviderHit {
        ProviderHit {
            title: "Report Title".to_string(),
            url: "https://www.Example.com/report?utm_source=x".to_string(),
            snippet: "  ".to_string(),
            published_at: None,
            doi: None,
            raw_score: Some(0.8),
        }
    }

    #[test]
    fn falls_back_to_title_when_snippet_empty() {
        let mut ids = IdAllocator::default();
        let evidence = normalize(ProviderTag::WebSearch, sample_hit(), None, &mut ids, "2024-01-01T00:00:00Z")
            .expect("should normalize");
        assert_eq!(evidence.snippet, "Content: Report Title");
        assert!(evidence.has_valid_snippet());
    }

    #[test]
    fn strips_www_and_tracking_params() {
        let mut ids = IdAllocator::default();
        let evidence = normalize(ProviderTag::WebSearch, sample_hit(), None, &mut ids, "2024-01-01T00:00:00Z")
            .expect("should normalize");
        assert_eq!(evidence.source_domain, "example.com");
        assert_eq!(evidence.canonical_url, "https://www.example.com/report");
    }

    #[test]
    fn falls_back_to_domain_line_when_title_and_snippet_are_empty() {
        let mut ids = IdAllocator::default();
        let hit = ProviderHit { title: "   ".to_string(), snippet: "   ".to_string(), ..sample_hit() };
        let evidence = normalize(ProviderTag::WebSearch, hit, None, &mut ids, "2024-01-01T00:00:00Z").expect("should normalize");
        assert_eq!(evidence.snippet, "Source content from example.com");
        assert!(evidence.has_valid_snippet());
    }

    #[test]
    fn drops_hit_with_no_usable_domain() {
        let mut ids = IdAllocator::default();
        let hit = ProviderHit { url: "not a url".to_string(), ..sample_hit() };
        assert!(normalize(ProviderTag::WebSearch, hit, None, &mut ids, "2024-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn preserves_real_snippet_text_as_the_extracted_quote_step() {
        let mut ids = IdAllocator::default();
        let hit = ProviderHit { snippet: "Actual extracted quote from the page.".to_string(), ..sample_hit() };
        let evidence = normalize(ProviderTag::WebSearch, hit, None, &mut ids, "2024-01-01T00:00:00Z").expect("should normalize");
        assert_eq!(evidence.snippet, "Actual extracted quote from the page.");
    }

    #[test]
    fn sets_family_for_known_domain_families() {
        let mut ids = IdAllocator::default();
        let hit = ProviderHit { url: "https://eurostat.ec.europa.eu/data".to_string(), ..sample_hit() };
        let evidence = normalize(ProviderTag::WebSearch, hit, None, &mut ids, "t").expect("ok");
        assert_eq!(evidence.family.as_deref(), Some("eu-official"));
    }

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdAllocator::default();
        let a = normalize(ProviderTag::WebSearch, sample_hit(), None, &mut ids, "t").expect("ok");
        let b = normalize(ProviderTag::WebSearch, sample_hit(), None, &mut ids, "t").expect("ok");
        assert_ne!(a.id, b.id);
    }
}
