// crates/research-pipeline/src/dedup.rs
// ============================================================================
// Module: Canonicalizer / Deduper
// Description: Collapses evidence records that share a canonical id, a
//              near-identical title on the same domain, or syndicated
//              content republished verbatim across domains.
// Purpose: Stop the same article (possibly fetched via two different
//          providers, mirrored under two URLs, or syndicated to a wire
//          partner) from inflating triangulation or domain counts.
// Dependencies: research_core::{Evidence, CanonicalId, SimilarityOracle}
// ============================================================================

//! ## Overview
//! Three dedup passes run back to back:
//!
//! 1. An exact pass on [`research_core::CanonicalId`] (DOI or URL
//!    fingerprint).
//! 2. A same-domain title-similarity pass using [`JaccardSimilarity`] (via
//!    the [`SimilarityOracle`] bag-of-words encoding) at a 0.9 threshold.
//! 3. A cross-domain content-syndication pass using MinHash over 6-word
//!    shingles of each record's best-available text, at a 0.92 Jaccard
//!    estimate — catching wire-service copy republished verbatim under
//!    different domains and titles.
//!
//! In every pass the higher-credibility record is kept.

use std::collections::HashSet;

use research_core::Evidence;
use research_core::SimilarityOracle;

/// Bag-of-words cosine similarity: the deterministic lexical fallback used
/// when no real embedding oracle is configured, per the [`SimilarityOracle`]
/// contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaccardSimilarity;

impl JaccardSimilarity {
    /// Tokenizes `text` into a lowercase alphanumeric-word set.
    fn tokenize(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_lowercase)
            .collect()
    }
}

impl SimilarityOracle for JaccardSimilarity {
    fn encode(&self, texts: &[String]) -> Vec<Vec<f64>> {
        let token_sets: Vec<HashSet<String>> = texts.iter().map(|t| Self::tokenize(t)).collect();
        let mut vocab: Vec<String> = token_sets.iter().flatten().cloned().collect();
        vocab.sort_unstable();
        vocab.dedup();
        token_sets
            .iter()
            .map(|set| vocab.iter().map(|word| if set.contains(word) { 1.0 } else { 0.0 }).collect())
            .collect()
    }
}

/// Same-domain title-similarity threshold above which two records are
/// considered duplicates.
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Shingle width (in words) for the content-syndication MinHash pass.
const SHINGLE_WIDTH: usize = 6;

/// Number of independent hash functions in the MinHash signature.
const MINHASH_PERMUTATIONS: usize = 64;

/// Estimated-Jaccard threshold above which two records are treated as
/// syndicated copies of the same content.
const SYNDICATION_SIMILARITY_THRESHOLD: f64 = 0.92;

/// Best-available text for a record, in priority order: extracted quote,
/// claim, snippet, title. Mirrors the triangulator's text-selection rule.
fn best_available_text(record: &Evidence) -> &str {
    record
        .best_quote
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| record.claim.as_deref().filter(|s| !s.is_empty()))
        .or_else(|| Some(record.snippet.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or(&record.title)
}

/// 6-word shingles of `text`'s lowercased word sequence.
fn shingles(text: &str, width: usize) -> HashSet<u64> {
    let words: Vec<String> = text.split_whitespace().map(str::to_ascii_lowercase).collect();
    if words.is_empty() {
        return HashSet::new();
    }
    if words.len() < width {
        return std::iter::once(fnv1a(&words.join(" "))).collect();
    }
    words.windows(width).map(|w| fnv1a(&w.join(" "))).collect()
}

/// FNV-1a hash, used as the base hash for shingles before MinHash
/// permutation; deterministic across runs.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

/// Deterministic per-permutation salt, mixed into the shingle hash before
/// taking the minimum, simulating independent hash functions.
fn permuted(hash: u64, salt: u64) -> u64 {
    hash.wrapping_mul(salt.wrapping_mul(2).wrapping_add(1)).rotate_left(17)
}

/// Computes a `MINHASH_PERMUTATIONS`-length MinHash signature for `text`'s
/// shingle set.
fn minhash_signature(text: &str) -> Vec<u64> {
    let shingle_hashes = shingles(text, SHINGLE_WIDTH);
    (0..MINHASH_PERMUTATIONS)
        .map(|i| {
            let salt = u64::try_from(i).unwrap_or(0).wrapping_add(1);
            shingle_hashes.iter().map(|h| permuted(*h, salt)).min().unwrap_or(u64::MAX)
        })
        .collect()
}

/// Fraction of matching signature slots, an unbiased estimator of the
/// underlying shingle-set Jaccard similarity.
fn minhash_similarity(a: &[u64], b: &[u64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss, reason = "signature length is a small fixed constant")]
    let matches = a.iter().zip(b).filter(|(x, y)| x == y).count() as f64;
    #[allow(clippy::cast_precision_loss, reason = "signature length is a small fixed constant")]
    (matches / a.len() as f64)
}

/// Deduplicates `records`, keeping the higher-credibility member of each
/// duplicate group and preserving the relative order of survivors.
///
/// # Invariants
/// - Two records with the same [`research_core::CanonicalId`] are always
///   merged, regardless of domain or title.
/// - Two records on different domains are never merged by title similarity
///   alone, but may still be merged by the content-syndication pass.
#[must_use]
pub fn dedup_records(records: Vec<Evidence>, similarity: &dyn SimilarityOracle) -> Vec<Evidence> {
    let by_canonical_id = dedup_by_canonical_id(records);
    let by_title = dedup_by_title_similarity(by_canonical_id, similarity);
    dedup_by_syndication(by_title)
}

/// Exact-identity pass: collapses records sharing a [`research_core::CanonicalId`].
fn dedup_by_canonical_id(records: Vec<Evidence>) -> Vec<Evidence> {
    let mut best: Vec<Evidence> = Vec::with_capacity(records.len());
    for record in records {
        if let Some(existing) = best.iter_mut().find(|r: &&mut Evidence| r.canonical_id == record.canonical_id) {
            if record.credibility_score > existing.credibility_score {
                *existing = record;
            }
        } else {
            best.push(record);
        }
    }
    best
}

/// Same-domain near-duplicate pass, via title similarity.
fn dedup_by_title_similarity(records: Vec<Evidence>, similarity: &dyn SimilarityOracle) -> Vec<Evidence> {
    let mut kept: Vec<Evidence> = Vec::with_capacity(records.len());
    for record in records {
        let duplicate_index = kept.iter().position(|existing| {
            existing.source_domain == record.source_domain && similarity.similarity(&existing.title, &record.title) >= TITLE_SIMILARITY_THRESHOLD
        });
        match duplicate_index {
            Some(idx) if record.credibility_score > kept[idx].credibility_score => kept[idx] = record,
            Some(_) => {}
            None => kept.push(record),
        }
    }
    kept
}

/// Cross-domain content-syndication pass: two records whose best-available
/// text shares a MinHash-estimated Jaccard similarity at or above
/// [`SYNDICATION_SIMILARITY_THRESHOLD`] are treated as the same syndicated
/// copy, keeping the higher-credibility one.
fn dedup_by_syndication(records: Vec<Evidence>) -> Vec<Evidence> {
    let mut kept: Vec<Evidence> = Vec::with_capacity(records.len());
    let mut kept_signatures: Vec<Vec<u64>> = Vec::with_capacity(records.len());
    for record in records {
        let signature = minhash_signature(best_available_text(&record));
        let duplicate_index = kept_signatures.iter().position(|existing| minhash_similarity(existing, &signature) >= SYNDICATION_SIMILARITY_THRESHOLD);
        match duplicate_index {
            Some(idx) if record.credibility_score > kept[idx].credibility_score => {
                kept[idx] = record;
                kept_signatures[idx] = signature;
            }
            Some(_) => {}
            None => {
                kept.push(record);
                kept_signatures.push(signature);
            }
        }
    }
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use research_core::CanonicalId;
    use research_core::ProviderTag;
    use research_core::Stance;

    use super::*;

    fn record(id: &str, canonical: CanonicalId, domain: &str, title: &str, credibility: f64) -> Evidence {
        Evidence {
            id: id.to_string(),
            canonical_id: canonical,
            provider: ProviderTag::WebSearch,
            url: format!("https://{domain}/{id}"),
            canonical_url: format!("https://{domain}/{id}"),
            source_domain: domain.to_string(),
            title: title.to_string(),
            snippet: "snippet".to_string(),
            best_quote: None,
            publication_date: None,
            collected_at: "t".to_string(),
            credibility_score: credibility,
            relevance_score: 0.5,
            confidence: 0.5,
            is_primary_source: false,
            is_triangulated: false,
            cluster_id: None,
            family: None,
            controversy_score: 0.0,
            stance: Stance::Neutral,
            disputed_by: std::collections::BTreeSet::new(),
            claim: None,
            supporting_text: None,
            subtopic_name: None,
        }
    }

    #[test]
    fn bag_of_words_similarity_is_symmetric_and_bounded() {
        let sim = JaccardSimilarity;
        let a = sim.similarity("EU tariffs on steel imports rise", "Steel import tariffs rise in EU");
        let b = sim.similarity("Steel import tariffs rise in EU", "EU tariffs on steel imports rise");
        assert!((a - b).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn same_canonical_id_collapses_regardless_of_domain() {
        let id = CanonicalId::Doi("10.1/x".to_string());
        let a = record("e1", id.clone(), "mirror-a.com", "Paper Title", 0.4);
        let b = record("e2", id, "mirror-b.com", "Different Title Entirely", 0.9);
        let result = dedup_records(vec![a, b], &JaccardSimilarity);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "e2");
    }

    #[test]
    fn same_domain_near_identical_titles_collapse() {
        let a = record(
            "e1",
            CanonicalId::UrlFingerprint("a".to_string()),
            "news.com",
            "GDP growth slows in second quarter",
            0.3,
        );
        let b = record(
            "e2",
            CanonicalId::UrlFingerprint("b".to_string()),
            "news.com",
            "GDP growth slows in the second quarter",
            0.7,
        );
        let result = dedup_records(vec![a, b], &JaccardSimilarity);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "e2");
    }

    #[test]
    fn different_domains_with_similar_titles_are_not_merged() {
        let a = record("e1", CanonicalId::UrlFingerprint("a".to_string()), "news.com", "GDP growth slows", 0.5);
        let b = record("e2", CanonicalId::UrlFingerprint("b".to_string()), "other.com", "GDP growth slows", 0.5);
        let result = dedup_records(vec![a, b], &JaccardSimilarity);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn syndicated_copy_across_domains_collapses_on_body_text() {
        let wire_text = "The central bank raised interest rates by a quarter point on Tuesday citing persistent inflation pressure across the region";
        let mut a = record("e1", CanonicalId::UrlFingerprint("a".to_string()), "wire-partner-a.com", "Rates raised", 0.4);
        a.snippet = wire_text.to_string();
        let mut b = record("e2", CanonicalId::UrlFingerprint("b".to_string()), "wire-partner-b.com", "Central bank hikes rates", 0.8);
        b.snippet = wire_text.to_string();
        let result = dedup_records(vec![a, b], &JaccardSimilarity);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "e2");
    }

    #[test]
    fn unrelated_content_across_domains_is_not_merged_by_syndication_pass() {
        let mut a = record("e1", CanonicalId::UrlFingerprint("a".to_string()), "site-a.com", "Title A", 0.5);
        a.snippet = "A completely unrelated story about a local bakery opening downtown".to_string();
        let mut b = record("e2", CanonicalId::UrlFingerprint("b".to_string()), "site-b.com", "Title B", 0.5);
        b.snippet = "Coverage of an entirely different topic concerning a distant sporting event".to_string();
        let result = dedup_records(vec![a, b], &JaccardSimilarity);
        assert_eq!(result.len(), 2);
    }
}
