// crates/research-dispatch/src/lib.rs
// ============================================================================
// Module: Research Dispatch
// Description: Deadline-bounded, per-provider-isolated concurrent query
//              fan-out.
// Purpose: The async replacement for a synchronous composite broker: every
//          planned query reaches its provider concurrently, one slow or
//          hung provider never blocks the others, and the whole batch is
//          still bounded by an overall deadline.
// Dependencies: tokio, research-core, research-providers
// ============================================================================

//! ## Overview
//! [`dispatcher::Dispatcher`] is the sole entry point: build it once around
//! a shared [`research_providers::ProviderRegistry`], then call
//! [`dispatcher::Dispatcher::dispatch_all`] once per collection round with
//! the round's planned (provider, query) pairs.

pub mod dispatcher;
pub mod error;

pub use dispatcher::DispatchOutcome;
pub use dispatcher::DispatchRequest;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
