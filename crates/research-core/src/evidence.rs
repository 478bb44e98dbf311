// crates/research-core/src/evidence.rs
// ============================================================================
// Module: Evidence Record
// Description: The atomic evidence unit produced by the normalizer.
// Purpose: Provide a single typed record replacing duck-typed provider hits.
// Dependencies: serde, crate::fingerprint
// ============================================================================

//! ## Overview
//! [`Evidence`] is the one record type every provider adapter fills and
//! every downstream stage mutates in place (snippet repair, credibility
//! adjustment, triangulation flag) until the gate evaluator freezes the
//! set for writing.
//!
//! Invariants:
//! - `snippet` is non-empty once a record leaves the normalizer.
//! - `credibility_score`, `relevance_score`, `confidence`,
//!   `controversy_score` all lie in `[0.0, 1.0]`.
//! - `canonical_id` is deterministic given `canonical_url` and an optional
//!   DOI (see [`crate::fingerprint`]).

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::fingerprint::CanonicalId;

/// Clamps a score into the closed unit interval.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Fixed enumeration of evidence providers.
///
/// # Invariants
/// - New providers are added here, never represented as free-form strings
///   in written artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTag {
    /// General-purpose web search API.
    WebSearch,
    /// A national or international statistical agency API.
    StatisticalAgency,
    /// An academic index (e.g. OpenAlex-style bibliographic search).
    AcademicIndex,
    /// A news or event feed.
    NewsFeed,
    /// A government records or regulatory filings API.
    GovernmentRecords,
    /// A parks, trails, or local-point-of-interest API.
    LocalPoi,
    /// A provider not covered by a more specific tag.
    Other,
}

impl ProviderTag {
    /// Returns true when the provider is a curated vertical/official source
    /// rather than a general web-search API.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        !matches!(self, Self::WebSearch)
    }
}

/// Stance of an evidence record relative to the claim it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Evidence supports the associated claim.
    Supports,
    /// Evidence disputes the associated claim.
    Disputes,
    /// Evidence is neutral with respect to the claim.
    Neutral,
}

/// The atomic evidence unit.
///
/// # Invariants
/// - `snippet` is non-empty after normalization.
/// - All score fields lie in `[0.0, 1.0]`.
/// - `canonical_id` is deterministic from `doi` when present, else from
///   `canonical_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Stable record id, unique within a run.
    pub id: String,
    /// Canonical identifier used for deduplication (DOI- or URL-based).
    pub canonical_id: CanonicalId,
    /// Provider that produced this record.
    pub provider: ProviderTag,
    /// Original URL as returned by the provider.
    pub url: String,
    /// Canonical URL (tracking parameters and fragment stripped).
    pub canonical_url: String,
    /// Lowercased, registered-domain form of the source host.
    pub source_domain: String,
    /// Page or record title.
    pub title: String,
    /// Non-empty snippet, at most 500 characters.
    pub snippet: String,
    /// Optional enriched quote, sentence-bounded.
    pub best_quote: Option<String>,
    /// ISO-8601 publication date, if known.
    pub publication_date: Option<String>,
    /// RFC 3339 timestamp of when this record was collected.
    pub collected_at: String,
    /// Credibility in `[0.0, 1.0]`.
    pub credibility_score: f64,
    /// Topical relevance in `[0.0, 1.0]`.
    pub relevance_score: f64,
    /// Combined confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// True when the source is an intent-scoped primary publisher.
    pub is_primary_source: bool,
    /// Set by the triangulator once the record joins a multi-domain cluster.
    pub is_triangulated: bool,
    /// Cluster this record belongs to, if triangulated.
    pub cluster_id: Option<u64>,
    /// Domain-family tag used for cap accounting.
    pub family: Option<String>,
    /// Degree of detected controversy in `[0.0, 1.0]`.
    pub controversy_score: f64,
    /// Stance relative to the associated claim.
    pub stance: Stance,
    /// Ids of evidence records that dispute this one.
    pub disputed_by: BTreeSet<String>,
    /// Free-text summary of the structured claim this record supports, if any.
    pub claim: Option<String>,
    /// Supporting excerpt written into the final evidence schema.
    pub supporting_text: Option<String>,
    /// Name of the query/facet (subtopic) that produced this record.
    pub subtopic_name: Option<String>,
}

impl Evidence {
    /// Returns true when the record's snippet satisfies the non-empty
    /// invariant.
    #[must_use]
    pub fn has_valid_snippet(&self) -> bool {
        !self.snippet.trim().is_empty() && self.snippet.chars().count() <= 500
    }

    /// Returns true when all score fields lie within `[0.0, 1.0]`.
    #[must_use]
    pub fn scores_in_bounds(&self) -> bool {
        let in_bounds = |v: f64| (0.0..=1.0).contains(&v);
        in_bounds(self.credibility_score)
            && in_bounds(self.relevance_score)
            && in_bounds(self.confidence)
            && in_bounds(self.controversy_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_unit_clamps_out_of_range_values() {
        assert!((clamp_unit(-1.0) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_unit(2.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_unit(f64::NAN) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn provider_tag_vertical_classification() {
        assert!(!ProviderTag::WebSearch.is_vertical());
        assert!(ProviderTag::StatisticalAgency.is_vertical());
    }
}
