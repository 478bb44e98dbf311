// crates/research-config/src/lib.rs
// ============================================================================
// Module: Research Config
// Description: Environment-driven, eagerly-validated configuration tree.
// Purpose: Centralize every tunable threshold and provider setting behind
//          one validated RunConfig value, so no component reads the
//          process environment ad hoc.
// Dependencies: research-core, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate owns process-environment access for the workspace. The CLI
//! calls [`RunConfig::from_env`] exactly once at startup; every failure it
//! can return maps to a named environment variable and a clear message, so
//! misconfiguration is caught before the first provider call is made.
//!
//! The one deliberate exception is per-provider API keys: those remain a
//! lazy, per-call lookup inside research-providers so a missing key
//! degrades that single provider to "skipped" rather than failing the
//! whole run at startup.

pub mod env;
pub mod error;
pub mod provider_config;
pub mod quality_config;
pub mod run_config;

pub use error::ConfigError;
pub use provider_config::CircuitBreakerConfig;
pub use provider_config::ProviderConfig;
pub use quality_config::BackfillConfig;
pub use quality_config::CredibilityConfig;
pub use quality_config::DomainBalanceConfig;
pub use quality_config::PrimaryShareConfig;
pub use quality_config::QualityConfig;
pub use quality_config::TriangulationConfig;
pub use run_config::RunConfig;
