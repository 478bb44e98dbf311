// crates/research-dispatch/src/error.rs
// ============================================================================
// Module: Dispatch Errors
// Description: Failure modes for the parallel provider dispatcher.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Individual provider failures never surface here; they come back inside
//! each [`crate::dispatcher::DispatchOutcome`]. This enum is for failures of
//! the dispatch operation itself.

use thiserror::Error;

/// Errors the dispatcher itself can raise, as opposed to per-provider
/// failures carried in each outcome.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The overall dispatch deadline elapsed before every provider
    /// finished; completed outcomes are still returned alongside this.
    #[error("dispatch deadline exceeded with {completed} of {total} calls finished")]
    DeadlineExceeded {
        /// Calls that finished before the deadline.
        completed: usize,
        /// Total calls requested.
        total: usize,
    },
    /// No requests were submitted.
    #[error("no dispatch requests submitted")]
    Empty,
}
