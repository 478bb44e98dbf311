// crates/research-providers/src/circuit.rs
// ============================================================================
// Module: Provider Circuit Breaker
// Description: Per-provider failure tracking with exponential backoff and a
//              cooldown-gated circuit trip.
// Dependencies: research_core::ProviderState, research_config::
//               CircuitBreakerConfig, crate::clock
// ============================================================================

//! ## Overview
//! Each provider gets its own [`CircuitBreaker`]. A 429 or repeated failure
//! backs a provider off exponentially (capped at the configured ceiling,
//! jittered to `[0.8, 1.2]` of the computed delay so many providers
//! recovering at once don't thunder-herd); `failure_threshold` consecutive
//! failures trips the circuit open for `cooldown_seconds`.

use std::sync::Mutex;

use research_config::CircuitBreakerConfig;
use research_core::ProviderState;
use research_core::RunRng;

use crate::clock::Clock;

/// Tracks one provider's health and decides whether it may be called.
///
/// # Invariants
/// - `state` is only ever mutated through [`Self::record_success`] and
///   [`Self::record_failure`]; nothing else advances it.
pub struct CircuitBreaker {
    /// Tuning shared across every breaker in a run.
    config: CircuitBreakerConfig,
    /// Mutable health state, behind a mutex since providers are dispatched
    /// concurrently.
    state: Mutex<ProviderState>,
}

impl CircuitBreaker {
    /// Creates a breaker with fresh (closed, zero-failure) state.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ProviderState::default()),
        }
    }

    /// Returns true when the provider may be called right now.
    #[must_use]
    pub fn is_available(&self, clock: &dyn Clock) -> bool {
        let guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.is_available(clock.now_millis())
    }

    /// Records a successful call, clearing backoff and circuit state.
    pub fn record_success(&self) {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.record_success();
    }

    /// Records a failed call. Only a `429` (rate limit) response schedules
    /// exponential backoff; any other failure still counts toward
    /// `failure_threshold` and can trip the circuit for `cooldown_seconds`.
    pub fn record_failure(&self, clock: &dyn Clock, rng: &mut RunRng, status_code: Option<u16>) {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.record_failure();
        let now = clock.now_millis();

        if status_code == Some(429) {
            let exponent = guard.consecutive_failures.saturating_sub(1).min(5);
            let multiplier = f64::from(2_u32.saturating_pow(exponent)).min(32.0);
            let base_backoff = self.config.initial_backoff.as_secs_f64() * multiplier;
            let capped_backoff = base_backoff.min(self.config.max_backoff.as_secs_f64());
            let jitter = rng.jitter(0.8, 1.2);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "backoff delays are bounded by max_backoff, far below i64::MAX millis"
            )]
            let backoff_millis = (capped_backoff * jitter * 1000.0) as i64;
            guard.backoff_until_millis = Some(now + backoff_millis);
        }

        if guard.consecutive_failures >= self.config.failure_threshold {
            #[allow(
                clippy::cast_possible_wrap,
                reason = "cooldown seconds are small positive integers"
            )]
            let cooldown_millis = (self.config.cooldown_seconds * 1000) as i64;
            guard.circuit_open_until_millis = Some(now + cooldown_millis);
        }
    }

    /// Returns a snapshot of the current health state.
    #[must_use]
    pub fn snapshot(&self) -> ProviderState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;
    use crate::clock::test_support::FakeClock;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            cooldown_seconds: 600,
            initial_backoff: std::time::Duration::from_secs(5),
            max_backoff: std::time::Duration::from_secs(300),
        })
    }

    #[test]
    fn trips_open_after_threshold_failures() {
        let cb = breaker();
        let clock = FakeClock::new(0);
        let mut rng = RunRng::from_seed_u64(1);
        for _ in 0..3 {
            cb.record_failure(&clock, &mut rng, None);
        }
        assert!(!cb.is_available(&clock));
        assert!(cb.snapshot().circuit_open_until_millis.is_some());
    }

    #[test]
    fn recovers_after_cooldown_elapses() {
        let cb = breaker();
        let clock = FakeClock::new(0);
        let mut rng = RunRng::from_seed_u64(1);
        for _ in 0..3 {
            cb.record_failure(&clock, &mut rng, None);
        }
        assert!(!cb.is_available(&clock));
        clock.advance(600_001);
        assert!(cb.is_available(&clock));
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let cb = breaker();
        let clock = FakeClock::new(0);
        let mut rng = RunRng::from_seed_u64(1);
        cb.record_failure(&clock, &mut rng, None);
        cb.record_failure(&clock, &mut rng, None);
        cb.record_success();
        assert_eq!(cb.snapshot().consecutive_failures, 0);
        assert!(cb.is_available(&clock));
    }

    #[test]
    fn backoff_grows_before_circuit_trips() {
        let cb = breaker();
        let clock = FakeClock::new(0);
        let mut rng = RunRng::from_seed_u64(7);
        cb.record_failure(&clock, &mut rng, Some(429));
        let after_one = cb.snapshot().backoff_until_millis.expect("backoff set");
        assert!(after_one > 0);
        assert!(!cb.is_available(&clock));
    }
}
