// crates/research-pipeline/src/backfill.rs
// ============================================================================
// Module: Backfill Controller
// Description: Generates targeted follow-up queries when a gate evaluation
//              falls short on triangulation or primary-source share.
// Purpose: Give a thin run one more aimed attempt at the specific gap the
//          gate identified, instead of a generic broader search.
// Dependencies: research_config::BackfillConfig, research_core::Depth,
//               crate::domain_balance::PRIMARY_POOL, crate::gate::GateFailure
// ============================================================================

//! ## Overview
//! Each failing [`GateFailure`] check maps to a fixed family of follow-up
//! queries: a triangulation shortfall gets `site:`-scoped queries against
//! the primary-source pool (more corroborating authorities, not more blog
//! coverage), and a primary-share shortfall gets the same treatment. A run
//! short of the absolute minimum-card floor (see
//! [`research_config::TriangulationConfig::min_cards`]) gets broad,
//! unscoped follow-up queries instead, since what it needs is more cards of
//! any kind, not more corroboration of what it already has. The controller
//! is capped by [`research_config::BackfillConfig::max_attempts`] rounds and
//! a "last mile" round only runs when both close to the target and still
//! within its time-budget allowance.

use research_config::BackfillConfig;

use crate::domain_balance::PRIMARY_POOL;
use crate::gate::GateFailure;

/// One generated backfill query and the gap it targets.
#[derive(Debug, Clone, PartialEq)]
pub struct BackfillQuery {
    /// Which failing check this query targets, e.g. `"triangulation_pct"`.
    pub purpose: String,
    /// The query text to dispatch.
    pub text: String,
}

/// Generates backfill queries for `failures`, scoped to `topic`.
///
/// # Invariants
/// - Returns at most `PRIMARY_POOL.len()` queries per failing check.
#[must_use]
pub fn generate_queries(topic: &str, failures: &[GateFailure]) -> Vec<BackfillQuery> {
    let mut queries = Vec::new();
    for failure in failures {
        if failure.check == "triangulation_pct" || failure.check == "primary_share_pct" || failure.check == "credible_cards" {
            for domain in PRIMARY_POOL.iter().take(3) {
                queries.push(BackfillQuery {
                    purpose: failure.check.clone(),
                    text: format!("{topic} site:{domain}"),
                });
            }
        }
    }
    queries
}

/// Whether `total_cards` falls short of the absolute minimum-card floor for
/// `supply`'s tier. This is a backfill trigger only, never a gate check:
/// see [`research_config::TriangulationConfig::min_cards`].
#[must_use]
pub fn below_min_cards_floor(total_cards: usize, min_cards: usize) -> bool {
    total_cards < min_cards
}

/// Generates broad, unscoped follow-up queries for a run short of the
/// minimum-card floor. Unlike [`generate_queries`], these are not
/// `site:`-scoped, since the goal is more cards of any kind rather than
/// corroboration from a specific pool of authorities.
#[must_use]
pub fn generate_min_cards_queries(topic: &str) -> Vec<BackfillQuery> {
    ["overview", "latest", "analysis"]
        .iter()
        .map(|angle| BackfillQuery { purpose: "min_cards_floor".to_string(), text: format!("{topic} {angle}") })
        .collect()
}

/// Whether the backfill controller should attempt another round.
///
/// # Invariants
/// - Never returns true once `attempts_used >= config.max_attempts`.
#[must_use]
pub fn should_attempt_round(config: &BackfillConfig, attempts_used: u32, time_budget_used_pct: f64) -> bool {
    if attempts_used >= config.max_attempts {
        return false;
    }
    time_budget_used_pct < 1.0
}

/// Whether a final "last mile" round should run: enabled, within shortfall
/// distance of the target, and enough time budget remains.
#[must_use]
pub fn should_attempt_last_mile(config: &BackfillConfig, shortfall_pp: f64, time_budget_used_pct: f64) -> bool {
    config.last_mile_enabled
        && shortfall_pp.abs() <= config.last_mile_pp_shortfall
        && (1.0 - time_budget_used_pct) >= config.last_mile_min_time_budget
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackfillConfig {
        BackfillConfig {
            max_attempts: 3,
            last_mile_enabled: true,
            last_mile_pp_shortfall: 0.05,
            last_mile_min_time_budget: 0.20,
            enabled: true,
        }
    }

    #[test]
    fn triangulation_failure_generates_primary_pool_queries() {
        let failures = vec![GateFailure {
            check: "triangulation_pct".to_string(),
            detail: "0.20 observed, 0.30 required".to_string(),
        }];
        let queries = generate_queries("carbon tariffs", &failures);
        assert!(!queries.is_empty());
        assert!(queries.iter().all(|q| q.text.contains("site:")));
    }

    #[test]
    fn unrelated_failure_generates_no_queries() {
        let failures = vec![GateFailure {
            check: "contradiction_pct".to_string(),
            detail: "0.30 observed, 0.10 required".to_string(),
        }];
        assert!(generate_queries("topic", &failures).is_empty());
    }

    #[test]
    fn below_min_cards_floor_triggers_on_shortfall_only() {
        assert!(below_min_cards_floor(5, 10));
        assert!(!below_min_cards_floor(10, 10));
        assert!(!below_min_cards_floor(15, 10));
    }

    #[test]
    fn min_cards_queries_are_unscoped() {
        let queries = generate_min_cards_queries("carbon tariffs");
        assert!(!queries.is_empty());
        assert!(queries.iter().all(|q| !q.text.contains("site:")));
        assert!(queries.iter().all(|q| q.purpose == "min_cards_floor"));
    }

    #[test]
    fn round_budget_is_exhausted_after_max_attempts() {
        let cfg = config();
        assert!(should_attempt_round(&cfg, 2, 0.5));
        assert!(!should_attempt_round(&cfg, 3, 0.5));
    }

    #[test]
    fn last_mile_requires_close_shortfall_and_time_left() {
        let cfg = config();
        assert!(should_attempt_last_mile(&cfg, 0.03, 0.5));
        assert!(!should_attempt_last_mile(&cfg, 0.20, 0.5));
        assert!(!should_attempt_last_mile(&cfg, 0.03, 0.9));
    }
}
