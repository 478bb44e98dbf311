// crates/research-pipeline/src/gate.rs
// ============================================================================
// Module: Gate Evaluator
// Description: Combines the quality threshold tables into a single
//              accept/reject decision for a run's evidence set.
// Purpose: Be the one place that decides whether a run ships a final report
//          or an insufficient-evidence report.
// Dependencies: research_config::QualityConfig, research_core::{RunMetrics,
//               SupplyContext}
// ============================================================================

//! ## Overview
//! [`evaluate`] checks triangulation rate, minimum credible-card count, and
//! primary-source share against [`research_config::QualityConfig`]'s tiered
//! thresholds, selected by the run's [`SupplyContext`]. Every failing check
//! is recorded, not just the first one, so the insufficient-evidence report
//! can explain every gap at once instead of making the operator iterate.
//! The absolute minimum-card floor (see [`research_config::TriangulationConfig::min_cards`])
//! is deliberately not one of these checks: it is a backfill trigger
//! consulted by [`crate::backfill`], not a gate predicate, so a run that
//! clears triangulation, credible-card, and primary-share thresholds on
//! fewer cards than the floor still passes.

use research_config::QualityConfig;
use research_core::RunMetrics;
use research_core::SupplyContext;
use research_core::SupplyTier;

/// One threshold a run failed to clear.
#[derive(Debug, Clone, PartialEq)]
pub struct GateFailure {
    /// Name of the check that failed, e.g. `"triangulation_pct"`.
    pub check: String,
    /// Human-readable detail, e.g. `"0.22 observed, 0.30 required"`.
    pub detail: String,
}

/// How strongly the gate's acceptance should be trusted by a reader of the
/// final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    /// Every check passed against its strict, [`SupplyTier::Normal`]
    /// threshold.
    High,
    /// Every check passed, but only after thresholds were relaxed for a
    /// [`SupplyTier::Constrained`] or [`SupplyTier::LowEvidence`] run, or
    /// because the run was evaluated in non-strict mode.
    Moderate,
    /// At least one check failed.
    Low,
}

impl ConfidenceLevel {
    /// The emoji tag used to render this level in the final report.
    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::High => "\u{1f7e2}",
            Self::Moderate => "\u{1f7e1}",
            Self::Low => "\u{1f534}",
        }
    }

    /// The human-readable label used alongside the emoji tag.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    /// True when every check passed.
    pub accepted: bool,
    /// Every failing check, empty when `accepted` is true.
    pub failures: Vec<GateFailure>,
    /// The supply context the thresholds were selected against.
    pub supply: SupplyContext,
    /// How strongly this decision should be trusted.
    pub confidence: ConfidenceLevel,
}

/// Evaluates `metrics` against `config`'s thresholds for a run with the
/// given `strict` mode and elapsed-time fraction.
///
/// # Invariants
/// - `failures` is empty if and only if `accepted` is true.
#[must_use]
pub fn evaluate(metrics: &RunMetrics, config: &QualityConfig, strict: bool, time_budget_used_pct: f64) -> GateDecision {
    let supply = metrics.supply_context(time_budget_used_pct);
    let mut failures = Vec::new();

    let triangulation_threshold = config.triangulation.get_threshold(strict, &supply);
    if metrics.triangulated_pct < triangulation_threshold {
        failures.push(GateFailure {
            check: "triangulation_pct".to_string(),
            detail: format!("{:.2} observed, {:.2} required", metrics.triangulated_pct, triangulation_threshold),
        });
    }

    if metrics.credible_cards < config.triangulation.min_credible_cards {
        failures.push(GateFailure {
            check: "credible_cards".to_string(),
            detail: format!(
                "{} observed, {} required",
                metrics.credible_cards, config.triangulation.min_credible_cards
            ),
        });
    }

    let primary_target = primary_share_target(&config.primary_share, metrics, &supply);
    if metrics.primary_share_pct < primary_target {
        failures.push(GateFailure {
            check: "primary_share_pct".to_string(),
            detail: format!("{:.2} observed, {:.2} required", metrics.primary_share_pct, primary_target),
        });
    }

    let accepted = failures.is_empty();
    let confidence = if !accepted {
        ConfidenceLevel::Low
    } else if strict && supply.tier() == SupplyTier::Normal {
        ConfidenceLevel::High
    } else {
        ConfidenceLevel::Moderate
    };

    GateDecision { accepted, failures, supply, confidence }
}

/// Resolves the primary-share target for `supply`'s tier: the `Normal`
/// target, unless primary share already clears the "plenty of primary
/// sources" relaxed threshold (in which case the constrained target
/// applies even under `Normal` supply), the constrained target under
/// [`SupplyTier::Constrained`], or the low-supply floor under
/// [`SupplyTier::LowEvidence`].
fn primary_share_target(config: &research_config::PrimaryShareConfig, metrics: &RunMetrics, supply: &SupplyContext) -> f64 {
    match supply.tier() {
        SupplyTier::LowEvidence => config.low_supply_pct,
        SupplyTier::Constrained => config.constrained_pct,
        SupplyTier::Normal if metrics.primary_share_pct >= config.primary_supply_relaxed_threshold => config.constrained_pct,
        SupplyTier::Normal => config.target_pct,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    fn metrics(total_cards: usize, unique_domains: usize, credible_cards: usize, triangulated_pct: f64, primary_share_pct: f64) -> RunMetrics {
        RunMetrics {
            total_cards,
            unique_domains,
            credible_cards,
            triangulated_pct,
            triangulated_cards: 0,
            triangulated_clusters: 0,
            primary_share_pct,
            top_domain_share: 0.0,
            contradiction_pct: 0.0,
            provider_error_rate: 0.0,
            elapsed_seconds: 100.0,
        }
    }

    #[test]
    fn ample_evidence_passes_every_check_at_high_confidence() {
        let config = QualityConfig::from_env().expect("defaults parse");
        let m = metrics(40, 10, 30, 0.45, 0.45);
        let decision = evaluate(&m, &config, true, 0.5);
        assert!(decision.accepted, "failures: {:?}", decision.failures);
        assert_eq!(decision.confidence, ConfidenceLevel::High);
    }

    #[test]
    fn thin_evidence_fails_triangulation_and_credible_cards() {
        let config = QualityConfig::from_env().expect("defaults parse");
        let m = metrics(3, 2, 1, 0.1, 0.1);
        let decision = evaluate(&m, &config, true, 0.9);
        assert!(!decision.accepted);
        assert!(decision.failures.iter().any(|f| f.check == "credible_cards"));
        assert_eq!(decision.confidence, ConfidenceLevel::Low);
    }

    #[test]
    fn min_cards_floor_is_not_a_gate_check() {
        let config = QualityConfig::from_env().expect("defaults parse");
        let m = metrics(1, 10, 30, 0.45, 0.45);
        let decision = evaluate(&m, &config, true, 0.5);
        assert!(decision.accepted, "failures: {:?}", decision.failures);
        assert!(decision.failures.iter().all(|f| f.check != "total_cards"));
    }

    #[test]
    fn low_evidence_relaxes_triangulation_threshold_at_moderate_confidence() {
        let config = QualityConfig::from_env().expect("defaults parse");
        let m = metrics(12, 3, 26, 0.26, 0.30);
        let decision = evaluate(&m, &config, true, 0.5);
        assert!(decision.accepted, "failures: {:?}", decision.failures);
        assert_eq!(decision.confidence, ConfidenceLevel::Moderate);
    }

    #[test]
    fn constrained_supply_uses_its_own_threshold_tier() {
        let config = QualityConfig::from_env().expect("defaults parse");
        let m = metrics(20, 6, 25, 0.28, 0.36);
        let decision = evaluate(&m, &config, true, 0.5);
        assert!(decision.accepted, "failures: {:?}", decision.failures);
        assert_eq!(decision.supply.tier(), SupplyTier::Constrained);
    }
}
