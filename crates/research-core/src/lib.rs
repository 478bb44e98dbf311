// crates/research-core/src/lib.rs
// ============================================================================
// Module: Research Core
// Description: Shared data model and capability traits for the research agent.
// Purpose: Define the Evidence/Cluster/Metrics types and provider/similarity
//          contracts every other crate in the workspace builds against.
// Dependencies: serde, serde_json, sha2, thiserror, time, async-trait
// ============================================================================

//! ## Overview
//! This crate is the backend-agnostic contract surface for the research
//! agent: the [`Evidence`] record and its satellites (clusters, structured
//! claims, provider health state, run metrics, run context), the
//! [`Provider`] and [`SimilarityOracle`] capability traits implementations
//! plug into, and canonical-id fingerprinting shared by the canonicalizer
//! and the triangulator.
//!
//! Invariants:
//! - [`Evidence::snippet`] is never empty once a record leaves the
//!   normalizer.
//! - All score fields are clamped to `[0.0, 1.0]` at construction.
//! - [`CanonicalId`] is deterministic: DOI-based when a DOI is present,
//!   else a stable fingerprint of the canonical URL.
//!
//! Security posture: evidence text and URLs originate from untrusted
//! third-party providers; every consumer must treat them as such.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod claim;
pub mod cluster;
pub mod context;
pub mod error;
pub mod evidence;
pub mod fingerprint;
pub mod intent;
pub mod metrics;
pub mod provider_state;
pub mod rng;
pub mod traits;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use claim::Period;
pub use claim::StructuredClaim;
pub use claim::Unit;
pub use claim::canonical_claim_key;
pub use cluster::Cluster;
pub use context::Depth;
pub use context::RunContext;
pub use context::now_rfc3339;
pub use context::now_unix_millis;
pub use error::PipelineError;
pub use evidence::Evidence;
pub use evidence::ProviderTag;
pub use evidence::Stance;
pub use evidence::clamp_unit;
pub use fingerprint::CanonicalId;
pub use fingerprint::canonicalize_url;
pub use fingerprint::fingerprint_url;
pub use intent::Intent;
pub use intent::IntentThresholds;
pub use metrics::RunMetrics;
pub use metrics::SupplyContext;
pub use metrics::SupplyTier;
pub use provider_state::ProviderState;
pub use rng::RunRng;
pub use rng::fnv1a;
pub use traits::Provider;
pub use traits::ProviderError;
pub use traits::ProviderHit;
pub use traits::ProviderKind;
pub use traits::ProviderQuery;
pub use traits::SimilarityOracle;
pub use traits::cosine;
