// crates/research-core/src/provider_state.rs
// ============================================================================
// Module: Provider Health State
// Description: Circuit-breaker bookkeeping for a single evidence provider.
// Purpose: Give research-providers a plain data type to mutate and the
//          metrics/report stages a type to read without depending on the
//          breaker's implementation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`ProviderState`] is the data half of the circuit breaker; the behavior
//! (when to trip, how long to back off) lives in research-providers so this
//! crate stays free of wall-clock policy.

use serde::Deserialize;
use serde::Serialize;

/// Point-in-time health snapshot for one provider.
///
/// # Invariants
/// - `consecutive_failures` resets to zero on every recorded success.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderState {
    /// Consecutive failures observed since the last success.
    pub consecutive_failures: u32,
    /// Total successful calls this run.
    pub total_successes: u64,
    /// Total failed calls this run.
    pub total_failures: u64,
    /// Unix-millis timestamp after which a backed-off provider may be
    /// retried; `None` when no backoff is in effect.
    pub backoff_until_millis: Option<i64>,
    /// Unix-millis timestamp after which a tripped circuit may be retried;
    /// `None` when the circuit is closed.
    pub circuit_open_until_millis: Option<i64>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            total_successes: 0,
            total_failures: 0,
            backoff_until_millis: None,
            circuit_open_until_millis: None,
        }
    }
}

impl ProviderState {
    /// Records a successful call, clearing failure bookkeeping.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.total_successes += 1;
        self.backoff_until_millis = None;
        self.circuit_open_until_millis = None;
    }

    /// Records a failed call.
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.total_failures += 1;
    }

    /// Overall error rate across recorded calls this run, in `[0.0, 1.0]`.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let total = self.total_successes + self.total_failures;
        if total == 0 {
            0.0
        } else {
            #[allow(
                clippy::cast_precision_loss,
                reason = "call counts fit comfortably in f64 mantissa precision for this run's lifetime"
            )]
            let rate = self.total_failures as f64 / total as f64;
            rate
        }
    }

    /// True when neither backoff nor an open circuit is blocking calls,
    /// as of `now_millis`.
    #[must_use]
    pub fn is_available(&self, now_millis: i64) -> bool {
        let backoff_clear = self.backoff_until_millis.is_none_or(|until| now_millis >= until);
        let circuit_clear = self
            .circuit_open_until_millis
            .is_none_or(|until| now_millis >= until);
        backoff_clear && circuit_clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_clears_failure_state() {
        let mut state = ProviderState::default();
        state.record_failure();
        state.record_failure();
        state.backoff_until_millis = Some(1_000);
        state.record_success();
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.backoff_until_millis.is_none());
    }

    #[test]
    fn availability_respects_backoff_window() {
        let mut state = ProviderState::default();
        state.backoff_until_millis = Some(1_000);
        assert!(!state.is_available(500));
        assert!(state.is_available(1_000));
    }

    #[test]
    fn error_rate_is_zero_with_no_calls() {
        let state = ProviderState::default();
        assert!((state.error_rate() - 0.0).abs() < f64::EPSILON);
    }
}
