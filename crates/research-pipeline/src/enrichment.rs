// crates/research-pipeline/src/enrichment.rs
// ============================================================================
// Module: Enrichment
// Description: DOI-link resolution and best-quote extraction.
// Purpose: Stop doi.org from dominating domain caps and triangulation, and
//          give each record the single sentence that most directly supports
//          its claim.
// Dependencies: research_providers::{HttpFetchConfig, resolve_final_url}
// ============================================================================

//! ## Overview
//! Two independent enrichments run per record, neither of which can fail the
//! run: a `doi.org` link is followed to its publisher landing page so later
//! domain-balance and credibility scoring see the real publisher instead of
//! the redirector, and a best-quote sentence is picked out of the snippet.
//! Both are best-effort: a DOI resolution failure leaves the record
//! unchanged rather than dropping it.

use research_core::Evidence;
use research_core::canonicalize_url;
use research_providers::HttpFetchConfig;

/// Resolves `evidence.url` through a DOI redirect chain when it points at
/// `doi.org`, rewriting `url`, `canonical_url`, and `source_domain` to the
/// publisher's landing page on success. Leaves the record untouched on any
/// failure.
pub async fn resolve_doi_redirect(evidence: &mut Evidence, config: &HttpFetchConfig) {
    if !is_doi_redirector(&evidence.url) {
        return;
    }
    let Ok(final_url) = research_providers::resolve_final_url(&evidence.url, config).await else {
        return;
    };
    if final_url == evidence.url {
        return;
    }
    let canonical = canonicalize_url(&final_url);
    if let Some(domain) = extract_domain(&canonical) {
        evidence.source_domain = domain;
        evidence.url = final_url;
        evidence.canonical_url = canonical;
    }
}

/// True when `url`'s host is a known DOI redirector.
fn is_doi_redirector(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == "doi.org" || host == "dx.doi.org")
}

/// Extracts a lowercased, `www.`-stripped domain from `url`.
fn extract_domain(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Picks the sentence within `evidence.snippet` most likely to directly
/// support `query_terms`, preferring sentences containing a digit (numbers
/// are usually the load-bearing part of a research claim) and falling back
/// to the first sentence.
///
/// # Invariants
/// - Returns `None` only when the snippet has no sentence-like content.
#[must_use]
pub fn extract_best_quote(snippet: &str, query_terms: &[&str]) -> Option<String> {
    let sentences = split_sentences(snippet);
    if sentences.is_empty() {
        return None;
    }

    let lowered_terms: Vec<String> = query_terms.iter().map(|t| t.to_ascii_lowercase()).collect();

    sentences
        .iter()
        .max_by_key(|s| sentence_score(s, &lowered_terms))
        .map(|s| s.trim().to_string())
}

/// Splits `text` into trimmed, non-empty sentences on `.`, `!`, and `?`.
fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Scores a candidate sentence: matched query terms count most, a digit is
/// worth one extra point, to prefer the sentence carrying the actual figure.
fn sentence_score(sentence: &str, lowered_terms: &[String]) -> usize {
    let lowered = sentence.to_ascii_lowercase();
    let term_hits = lowered_terms.iter().filter(|t| lowered.contains(t.as_str())).count();
    let has_digit = usize::from(sentence.chars().any(|c| c.is_ascii_digit()));
    term_hits * 2 + has_digit
}

/// Sets `evidence.best_quote` and `evidence.supporting_text` from its
/// snippet and the originating query text.
pub fn enrich_best_quote(evidence: &mut Evidence, query_text: &str) {
    let terms: Vec<&str> = query_text.split_whitespace().collect();
    if let Some(quote) = extract_best_quote(&evidence.snippet, &terms) {
        evidence.supporting_text = Some(quote.clone());
        evidence.best_quote = Some(quote);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    #[test]
    fn picks_sentence_with_query_terms_and_digit() {
        let snippet = "This report covers background context. GDP grew 3.2 percent in the second quarter. Analysts expect more data soon.";
        let quote = extract_best_quote(snippet, &["gdp", "percent"]).expect("should find a quote");
        assert!(quote.contains("3.2 percent"));
    }

    #[test]
    fn falls_back_to_first_sentence_with_no_term_match() {
        let snippet = "Only one sentence here";
        let quote = extract_best_quote(snippet, &["unrelated"]).expect("should find a quote");
        assert_eq!(quote, "Only one sentence here");
    }

    #[test]
    fn empty_snippet_yields_no_quote() {
        assert!(extract_best_quote("", &["term"]).is_none());
    }

    #[test]
    fn doi_redirector_detection_is_host_based() {
        assert!(is_doi_redirector("https://doi.org/10.1234/example"));
        assert!(is_doi_redirector("https://dx.doi.org/10.1234/example"));
        assert!(!is_doi_redirector("https://example.com/doi.org/fake"));
    }
}
