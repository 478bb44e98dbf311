// crates/research-pipeline/src/lib.rs
// ============================================================================
// Module: Research Pipeline
// Description: The evidence pipeline itself — intent classification,
//              planning, normalization, dedup, enrichment, triangulation,
//              domain balancing, credibility scoring, backfill, gate
//              evaluation, and report rendering.
// Purpose: Carry a topic string from plan to final (or insufficient-evidence)
//          report, independent of how the CLI wires up providers or I/O.
// Dependencies: research-core, research-config, research-dispatch,
//               research-providers
// ============================================================================

//! ## Overview
//! Every stage here is a pure function over [`research_core::Evidence`] or a
//! thin async wrapper around one, so the CLI crate can drive them in
//! whatever order (including the backfill retry loop) without this crate
//! knowing about run directories, clap, or tracing subscribers. The stage
//! order a normal run follows is:
//! [`intent_classifier::classify`] → [`query_planner::plan`] →
//! (dispatch, in research-dispatch) → [`normalizer::normalize`] →
//! [`dedup::dedup_records`] → [`enrichment`] → [`claim_extractor::extract`] →
//! [`triangulator::triangulate`] →
//! [`domain_balance::enforce_cap`] → [`credibility::score`] →
//! [`metrics_aggregator::aggregate`] → [`gate::evaluate`] →
//! ([`backfill::generate_queries`] and retry, or) [`report`] →
//! [`artifacts::write_run_artifacts`].

pub mod artifacts;
pub mod backfill;
pub mod claim_extractor;
pub mod credibility;
pub mod dedup;
pub mod domain_balance;
pub mod enrichment;
pub mod gate;
pub mod intent_classifier;
pub mod metrics_aggregator;
pub mod normalizer;
pub mod query_planner;
pub mod report;
pub mod triangulator;

pub use backfill::BackfillQuery;
pub use claim_extractor::extract as extract_claim;
pub use credibility::is_primary_like;
pub use dedup::JaccardSimilarity;
pub use dedup::dedup_records;
pub use domain_balance::enforce_cap;
pub use gate::ConfidenceLevel;
pub use gate::GateDecision;
pub use gate::GateFailure;
pub use gate::evaluate;
pub use intent_classifier::Classification;
pub use intent_classifier::classify;
pub use intent_classifier::classify_detailed;
pub use metrics_aggregator::aggregate;
pub use normalizer::IdAllocator;
pub use normalizer::normalize;
pub use query_planner::PlannedQuery;
pub use query_planner::QueryPlan;
pub use query_planner::plan;
pub use query_planner::render_plan_markdown;
pub use triangulator::DEFAULT_CLUSTER_SIMILARITY_THRESHOLD;
pub use triangulator::triangulate;
