// crates/research-core/src/metrics.rs
// ============================================================================
// Module: Run Metrics
// Description: Aggregate counters the gate evaluator and report render read.
// Purpose: Carry the numbers behind a run's accept/reject decision without
//          re-deriving them from the evidence set at every stage.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`RunMetrics`] is computed once, after triangulation and domain balancing
//! settle, and is read (never mutated) by the gate evaluator, the report
//! renderer, and the final `metrics.json` artifact. [`SupplyContext`]
//! captures the handful of counts the gate evaluator needs to classify a
//! run into one of three supply tiers ([`SupplyTier`]), each selecting its
//! own threshold set rather than a single low-supply/normal-supply switch.

use serde::Deserialize;
use serde::Serialize;

/// A run's evidence-supply classification, used to pick which threshold set
/// a gate evaluation is graded against.
///
/// # Invariants
/// - `Normal` is only reachable when every one of its three conditions
///   holds; a run failing any one of them falls through to `Constrained` or
///   `LowEvidence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyTier {
    /// At least 8 unique domains, 30 credible cards, and a provider error
    /// rate under 0.20.
    Normal,
    /// At least 6 unique domains, 25 credible cards, and a provider error
    /// rate under 0.30.
    Constrained,
    /// Neither tier's conditions were met.
    LowEvidence,
}

/// Supply-side counts the gate evaluator uses to select a [`SupplyTier`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplyContext {
    /// Total evidence cards retained after dedup and domain balancing.
    pub total_cards: usize,
    /// Distinct source domains among retained cards.
    pub unique_domains: usize,
    /// Cards meeting the credibility floor.
    pub credible_cards: usize,
    /// Overall provider error rate observed during collection.
    pub provider_error_rate: f64,
    /// Fraction of the overall run time budget consumed when supply was
    /// assessed, in `[0.0, 1.0]`.
    pub time_budget_used_pct: f64,
}

impl SupplyContext {
    /// Classifies this context into a [`SupplyTier`] using the fixed tier
    /// boundaries: `Normal` requires at least 8 unique domains, 30 credible
    /// cards, and a provider error rate under 0.20; `Constrained` requires
    /// at least 6 unique domains, 25 credible cards, and a provider error
    /// rate under 0.30; anything short of `Constrained` is `LowEvidence`.
    #[must_use]
    pub fn tier(&self) -> SupplyTier {
        if self.unique_domains >= 8 && self.credible_cards >= 30 && self.provider_error_rate < 0.20 {
            SupplyTier::Normal
        } else if self.unique_domains >= 6 && self.credible_cards >= 25 && self.provider_error_rate < 0.30 {
            SupplyTier::Constrained
        } else {
            SupplyTier::LowEvidence
        }
    }
}

/// Aggregate counters produced after triangulation and domain balancing.
///
/// # Invariants
/// - `triangulated_pct` and `primary_share_pct` lie in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Total retained evidence cards.
    #[serde(rename = "cards")]
    pub total_cards: usize,
    /// Distinct source domains among retained cards.
    pub unique_domains: usize,
    /// Cards meeting the credibility floor.
    pub credible_cards: usize,
    /// Fraction of cards that are part of a multi-domain cluster.
    #[serde(rename = "union_triangulation")]
    pub triangulated_pct: f64,
    /// Number of cards that are part of a multi-domain cluster.
    pub triangulated_cards: usize,
    /// Number of clusters that span at least two distinct domains.
    pub triangulated_clusters: usize,
    /// Fraction of cards sourced from a primary/official publisher.
    #[serde(rename = "primary_share")]
    pub primary_share_pct: f64,
    /// Share of retained cards attributable to the single most common
    /// domain (or domain family), after domain balancing.
    pub top_domain_share: f64,
    /// Fraction of cards flagged as contradicted by another cluster member.
    pub contradiction_pct: f64,
    /// Overall provider error rate observed during collection.
    pub provider_error_rate: f64,
    /// Wall-clock seconds elapsed for the run so far.
    pub elapsed_seconds: f64,
}

impl RunMetrics {
    /// Derives the [`SupplyContext`] a gate evaluation needs from this
    /// metrics snapshot.
    #[must_use]
    pub fn supply_context(&self, time_budget_used_pct: f64) -> SupplyContext {
        SupplyContext {
            total_cards: self.total_cards,
            unique_domains: self.unique_domains,
            credible_cards: self.credible_cards,
            provider_error_rate: self.provider_error_rate,
            time_budget_used_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_tier_requires_all_three_conditions() {
        let ctx = SupplyContext { total_cards: 40, unique_domains: 8, credible_cards: 30, provider_error_rate: 0.1, time_budget_used_pct: 0.5 };
        assert_eq!(ctx.tier(), SupplyTier::Normal);
    }

    #[test]
    fn falls_to_constrained_when_normal_domain_floor_missed() {
        let ctx = SupplyContext { total_cards: 40, unique_domains: 7, credible_cards: 30, provider_error_rate: 0.1, time_budget_used_pct: 0.5 };
        assert_eq!(ctx.tier(), SupplyTier::Constrained);
    }

    #[test]
    fn falls_to_low_evidence_when_constrained_floor_missed() {
        let ctx = SupplyContext { total_cards: 10, unique_domains: 3, credible_cards: 5, provider_error_rate: 0.1, time_budget_used_pct: 0.5 };
        assert_eq!(ctx.tier(), SupplyTier::LowEvidence);
    }

    #[test]
    fn high_provider_error_rate_overrides_otherwise_ample_supply() {
        let ctx = SupplyContext { total_cards: 40, unique_domains: 10, credible_cards: 35, provider_error_rate: 0.35, time_budget_used_pct: 0.5 };
        assert_eq!(ctx.tier(), SupplyTier::LowEvidence);
    }

    #[test]
    fn supply_context_derivation() {
        let metrics = RunMetrics {
            total_cards: 30,
            unique_domains: 8,
            credible_cards: 25,
            triangulated_pct: 0.4,
            triangulated_cards: 12,
            triangulated_clusters: 4,
            primary_share_pct: 0.3,
            top_domain_share: 0.2,
            contradiction_pct: 0.05,
            provider_error_rate: 0.5,
            elapsed_seconds: 120.0,
        };
        let ctx = metrics.supply_context(0.6);
        assert_eq!(ctx.unique_domains, 8);
        assert_eq!(ctx.credible_cards, 25);
        assert!((ctx.provider_error_rate - 0.5).abs() < f64::EPSILON);
    }
}
