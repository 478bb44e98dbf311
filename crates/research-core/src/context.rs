// crates/research-core/src/context.rs
// ============================================================================
// Module: Run Context
// Description: The immutable parameters threaded through a single run.
// Purpose: Replace ad hoc argument lists with one value every stage reads.
// Dependencies: serde, crate::intent
// ============================================================================

//! ## Overview
//! [`RunContext`] is built once by the CLI from parsed arguments and loaded
//! configuration, then passed by reference to every pipeline stage. Nothing
//! downstream of the CLI reads environment variables or argv directly.

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::intent::Intent;

/// Current wall-clock time as Unix milliseconds.
///
/// The sole point in the workspace that samples the system clock; every
/// other stage receives a timestamp as a plain value so its behavior stays
/// deterministic under test.
#[must_use]
pub fn now_unix_millis() -> i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "nanosecond-to-millisecond timestamps for the foreseeable future fit i64"
    )]
    {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// Current wall-clock time formatted as RFC 3339, for evidence
/// `collected_at` stamps and run-directory names.
#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Depth setting controlling how much time/evidence budget a run is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// A fast, lower-confidence pass.
    Quick,
    /// The default balance of thoroughness and latency.
    Standard,
    /// A slower, exhaustive pass with relaxed time budget.
    Deep,
}

impl Depth {
    /// Overall wall-clock budget, in seconds, for this depth setting.
    #[must_use]
    pub const fn time_budget_seconds(self) -> u64 {
        match self {
            Self::Quick => 180,
            Self::Standard => 600,
            Self::Deep => 1800,
        }
    }
}

/// The immutable parameters for one research run.
///
/// # Invariants
/// - `run_id` is filesystem-safe and unique per invocation.
/// - `started_at_unix_millis` never changes after construction; elapsed
///   time is always derived, never re-sampled from this field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    /// The user-supplied research topic, verbatim.
    pub topic: String,
    /// Filesystem-safe slug derived from `topic`, used in the run directory
    /// name.
    pub topic_slug: String,
    /// Classified intent for `topic`.
    pub intent: Intent,
    /// Requested depth.
    pub depth: Depth,
    /// Absolute path to the run's output directory.
    pub run_dir: String,
    /// Maximum provider spend, in USD, before collection halts.
    pub max_cost_usd: f64,
    /// True when strict mode rejects any non-primary source for a
    /// primary-only intent outright, rather than merely down-weighting it.
    pub strict: bool,
    /// True when resuming a previously interrupted run directory.
    pub resume: bool,
    /// Unix-millis timestamp the run started at.
    pub started_at_unix_millis: i64,
    /// Run identifier unique within the output directory.
    pub run_id: String,
}

impl RunContext {
    /// Unix-millis timestamp the run's deadline falls at.
    #[must_use]
    pub fn deadline_unix_millis(&self) -> i64 {
        #[allow(
            clippy::cast_possible_wrap,
            reason = "depth budgets are small constants far below i64::MAX seconds"
        )]
        let budget_millis = (self.depth.time_budget_seconds() * 1000) as i64;
        self.started_at_unix_millis + budget_millis
    }

    /// Fraction of the time budget consumed as of `now_unix_millis`, clamped
    /// to `[0.0, 1.0]`.
    #[must_use]
    pub fn time_budget_used_pct(&self, now_unix_millis: i64) -> f64 {
        let elapsed = (now_unix_millis - self.started_at_unix_millis).max(0);
        let budget = self.deadline_unix_millis() - self.started_at_unix_millis;
        if budget <= 0 {
            1.0
        } else {
            #[allow(
                clippy::cast_precision_loss,
                reason = "millisecond counts for run budgets fit f64 precision"
            )]
            let pct = elapsed as f64 / budget as f64;
            pct.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> RunContext {
        RunContext {
            topic: "EU carbon tariffs".to_string(),
            topic_slug: "eu-carbon-tariffs".to_string(),
            intent: Intent::Regulatory,
            depth: Depth::Standard,
            run_dir: "/tmp/run".to_string(),
            max_cost_usd: 5.0,
            strict: false,
            resume: false,
            started_at_unix_millis: 0,
            run_id: "r1".to_string(),
        }
    }

    #[test]
    fn deadline_tracks_depth_budget() {
        let ctx = sample_context();
        assert_eq!(ctx.deadline_unix_millis(), 600_000);
    }

    #[test]
    fn time_budget_used_clamps_at_one() {
        let ctx = sample_context();
        assert!((ctx.time_budget_used_pct(10_000_000) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn time_budget_used_is_zero_at_start() {
        let ctx = sample_context();
        assert!((ctx.time_budget_used_pct(0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn now_unix_millis_is_plausible() {
        // Sanity bound only: any time after this crate was written.
        assert!(now_unix_millis() > 1_700_000_000_000);
    }

    #[test]
    fn now_rfc3339_produces_a_parseable_timestamp() {
        let stamp = now_rfc3339();
        assert!(stamp.contains('T'));
        assert!(stamp.ends_with('Z') || stamp.contains('+'));
    }
}
