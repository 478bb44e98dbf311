// crates/research-providers/src/clock.rs
// ============================================================================
// Module: Clock
// Description: Wall-clock abstraction for circuit-breaker timing.
// Purpose: Let the breaker's backoff/cooldown math be tested without real
//          sleeps, while production always uses the system clock.
// Dependencies: std::time
// ============================================================================

//! ## Overview
//! research-core's data model deliberately never reads wall-clock time, but
//! the circuit breaker's whole job is wall-clock math. [`Clock`] is the
//! narrow seam that keeps that reasoning host-supplied and testable instead
//! of calling `SystemTime::now()` inline throughout `circuit.rs`.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// A source of the current time, in Unix milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current time as Unix milliseconds.
    fn now_millis(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        #[allow(
            clippy::cast_possible_wrap,
            reason = "milliseconds since epoch fit in i64 until the year 292277026596"
        )]
        let millis = duration.as_millis() as i64;
        millis
    }
}

#[cfg(test)]
/// Test-only clock doubles for deterministic time control.
pub mod test_support {
    use std::sync::atomic::AtomicI64;
    use std::sync::atomic::Ordering;

    use super::Clock;

    /// A clock with a manually-advanced value, for deterministic tests.
    #[derive(Debug, Default)]
    pub struct FakeClock {
        /// Current fake time, in Unix milliseconds.
        millis: AtomicI64,
    }

    impl FakeClock {
        /// Creates a fake clock starting at `start_millis`.
        #[must_use]
        pub fn new(start_millis: i64) -> Self {
            Self {
                millis: AtomicI64::new(start_millis),
            }
        }

        /// Advances the fake clock by `delta_millis`.
        pub fn advance(&self, delta_millis: i64) {
            self.millis.fetch_add(delta_millis, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }
    }
}
