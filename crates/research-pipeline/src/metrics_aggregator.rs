// crates/research-pipeline/src/metrics_aggregator.rs
// ============================================================================
// Module: Metrics Aggregator
// Description: Rolls a retained evidence set and collection-time provider
//              error rate up into one RunMetrics snapshot.
// Purpose: Be the one place that derives the gate evaluator's input numbers
//          from the evidence set, so the CLI's orchestration code never
//          recomputes a percentage inline.
// Dependencies: research_core::{Evidence, RunMetrics}
// ============================================================================

//! ## Overview
//! [`aggregate`] runs once, after triangulation and domain balancing settle
//! but before [`crate::gate::evaluate`]. A card counts as credible once its
//! `credibility_score` clears `credibility_floor`; this mirrors the lowest
//! base score [`crate::credibility::score`] ever assigns a non-singleton
//! record, so a record downweighted below that floor genuinely failed to
//! earn a baseline credibility tier rather than just losing a triangulation
//! bonus. `top_domain_share` groups by [`Evidence::family`] where one is
//! set, so a domain family cannot understate its own concentration by
//! spreading across sibling subdomains.

use research_core::Cluster;
use research_core::Evidence;
use research_core::RunMetrics;

/// Derives a [`RunMetrics`] snapshot from the final retained evidence set
/// and its triangulation clusters.
///
/// # Invariants
/// - Every percentage field is `0.0` when `records` is empty rather than
///   `NaN`.
#[must_use]
pub fn aggregate(records: &[Evidence], clusters: &[Cluster], credibility_floor: f64, provider_error_rate: f64, elapsed_seconds: f64) -> RunMetrics {
    let total_cards = records.len();
    let unique_domains = crate::domain_balance::count_unique_domains(records);
    let credible_cards = records.iter().filter(|r| r.credibility_score >= credibility_floor).count();

    #[allow(clippy::cast_precision_loss, reason = "evidence counts per run are small and fit f64 precision")]
    let total_cards_f64 = total_cards as f64;
    let triangulated_cards = records.iter().filter(|r| r.is_triangulated).count();
    let triangulated_pct = ratio(triangulated_cards, total_cards_f64);
    let triangulated_clusters = clusters.iter().filter(|c| c.is_triangulated).count();
    let primary_share_pct = ratio(records.iter().filter(|r| r.is_primary_source).count(), total_cards_f64);
    let top_domain_share = ratio(top_group_count(records), total_cards_f64);
    let contradiction_pct = ratio(records.iter().filter(|r| r.controversy_score > 0.0).count(), total_cards_f64);

    RunMetrics {
        total_cards,
        unique_domains,
        credible_cards,
        triangulated_pct,
        triangulated_cards,
        triangulated_clusters,
        primary_share_pct,
        top_domain_share,
        contradiction_pct,
        provider_error_rate,
        elapsed_seconds,
    }
}

/// Returns the record count of the single most common domain-or-family
/// grouping among `records`.
fn top_group_count(records: &[Evidence]) -> usize {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for record in records {
        let key = record.family.as_deref().unwrap_or(record.source_domain.as_str());
        *counts.entry(key).or_insert(0) += 1;
    }
    counts.values().copied().max().unwrap_or(0)
}

/// Returns `count / total`, or `0.0` when `total` is zero.
#[allow(clippy::cast_precision_loss, reason = "evidence counts per run are small and fit f64 precision")]
fn ratio(count: usize, total: f64) -> f64 {
    if total == 0.0 { 0.0 } else { count as f64 / total }
}
