// crates/research-config/src/run_config.rs
// ============================================================================
// Module: Run Configuration
// Description: The top-level, environment-driven configuration tree.
// Purpose: Build one validated config value at CLI startup; every other
//          component receives it read-only.
// Dependencies: crate::env, crate::error, crate::provider_config,
//               crate::quality_config
// ============================================================================

//! ## Overview
//! [`RunConfig`] is assembled once, in [`RunConfig::from_env`], and
//! validated eagerly so a misconfigured environment fails fast with a
//! named variable rather than surfacing mid-run as a cryptic provider
//! error.

use crate::env::read_f64;
use crate::env::read_string;
use crate::error::ConfigError;
use crate::provider_config::ProviderConfig;
use crate::quality_config::QualityConfig;

/// Top-level run configuration, built once from the process environment.
///
/// # Invariants
/// - `global_seed` is non-empty; [`RunConfig::from_env`] substitutes a
///   fixed default rather than leaving randomness process-dependent.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Seed string for the run's deterministic RNG (`RA_GLOBAL_SEED`).
    pub global_seed: String,
    /// Default output directory when `--output-dir` is not passed.
    pub default_output_dir: String,
    /// Default per-run cost ceiling in USD when `--max-cost` is not passed.
    pub default_max_cost_usd: f64,
    /// Tracing filter directive (`LOG_LEVEL`), passed to `EnvFilter`.
    pub log_level: String,
    /// Quality thresholds consulted throughout the pipeline.
    pub quality: QualityConfig,
    /// Provider selection and circuit-breaker tuning.
    pub providers: ProviderConfig,
}

impl RunConfig {
    /// Loads and validates the full configuration tree from the process
    /// environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on the first invalid or out-of-range value
    /// encountered.
    pub fn from_env() -> Result<Self, ConfigError> {
        let global_seed = read_string("RA_GLOBAL_SEED").unwrap_or_else(|| "research-agent".to_string());
        let default_output_dir = read_string("RA_OUTPUT_DIR").unwrap_or_else(|| "outputs".to_string());
        let default_max_cost_usd = read_f64("RA_MAX_COST_USD", 5.0)?;
        let log_level = read_string("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        Ok(Self {
            global_seed,
            default_output_dir,
            default_max_cost_usd,
            log_level,
            quality: QualityConfig::from_env()?,
            providers: ProviderConfig::from_env()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    #[test]
    fn from_env_succeeds_with_defaults() {
        let config = RunConfig::from_env().expect("defaults must validate");
        assert!(!config.global_seed.is_empty());
        assert!(config.default_max_cost_usd > 0.0);
    }
}
