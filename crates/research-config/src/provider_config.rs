// crates/research-config/src/provider_config.rs
// ============================================================================
// Module: Provider Configuration
// Description: Circuit-breaker tuning and the provider allowlist.
// Purpose: Give research-providers validated, non-env-reading settings;
//          per-provider API keys remain a lazy, per-call lookup so a
//          missing key degrades to "provider skipped", never a startup
//          failure.
// Dependencies: crate::env, crate::error
// ============================================================================

//! ## Overview
//! Circuit-breaker tuning mirrors a previously tuned default (3 consecutive
//! failures trips the breaker, a 600-second cooldown, exponential backoff
//! bounded to 300 seconds starting at 5 seconds) and every value is
//! overridable via environment variable.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::env::read_bool;
use crate::env::read_csv_set;
use crate::env::read_string;
use crate::env::read_u64;
use crate::env::validate_range;
use crate::error::ConfigError;

/// Placeholder base URL for the generic web-search provider until an
/// operator points it at a real vendor endpoint.
const DEFAULT_WEB_SEARCH_BASE_URL: &str = "https://api.web-search.invalid";

/// Placeholder base URL for the generic statistical-agency provider until
/// an operator points it at a real vendor endpoint.
const DEFAULT_STATS_AGENCY_BASE_URL: &str = "https://api.stats-agency.invalid";

/// Circuit-breaker tuning shared by every registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures required to trip the circuit.
    pub failure_threshold: u32,
    /// Seconds a tripped circuit stays open before retry is allowed.
    pub cooldown_seconds: u64,
    /// Initial backoff applied after a single failure.
    pub initial_backoff: Duration,
    /// Backoff ceiling regardless of consecutive failure count.
    pub max_backoff: Duration,
}

impl CircuitBreakerConfig {
    /// Loads circuit-breaker tuning from environment overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any override fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "failure-threshold counts are small positive integers"
        )]
        let failure_threshold = read_u64("PROVIDER_CB_THRESHOLD", 3)? as u32;
        let cooldown_seconds = read_u64("PROVIDER_CB_COOLDOWN", 600)?;
        let initial_backoff_secs = read_u64("PROVIDER_INITIAL_BACKOFF", 5)?;
        let max_backoff_secs = read_u64("PROVIDER_MAX_BACKOFF", 300)?;
        Ok(Self {
            failure_threshold,
            cooldown_seconds,
            initial_backoff: Duration::from_secs(initial_backoff_secs),
            max_backoff: Duration::from_secs(max_backoff_secs),
        })
    }
}

/// Which providers a run is permitted to call.
///
/// # Invariants
/// - An empty `denylist` and empty `allowlist` means every registered
///   provider is permitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// When non-empty, only these provider names may be used.
    pub allowlist: BTreeSet<String>,
    /// Provider names that are never used, regardless of `allowlist`.
    pub denylist: BTreeSet<String>,
    /// Maximum bytes read from any single provider HTTP response.
    pub max_response_bytes: u64,
    /// Per-request timeout for provider HTTP calls, in milliseconds.
    pub request_timeout_ms: u64,
    /// DOI-resolution request timeout, in seconds.
    pub doi_resolution_timeout_secs: u64,
    /// Circuit-breaker tuning.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Builtin provider names to register; empty means "all of them".
    pub enabled_providers: BTreeSet<String>,
    /// Master switch for the builtin free (no-API-key) providers.
    pub enable_free_apis: bool,
    /// Base URL for the generic web-search JSON provider.
    pub web_search_base_url: String,
    /// Base URL for the generic statistical-agency JSON provider.
    pub stats_agency_base_url: String,
}

impl ProviderConfig {
    /// Loads provider configuration from environment overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any override fails to parse or validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let allowlist = read_csv_set("RA_PROVIDER_ALLOWLIST");
        let denylist = read_csv_set("RA_PROVIDER_DENYLIST");
        let max_response_bytes = read_u64("RA_PROVIDER_MAX_RESPONSE_BYTES", 2_000_000)?;
        let request_timeout_ms = read_u64("RA_PROVIDER_REQUEST_TIMEOUT_MS", 10_000)?;
        let doi_resolution_timeout_secs = read_u64("RA_DOI_RESOLUTION_TIMEOUT_SECS", 20)?;
        validate_range(
            "RA_DOI_RESOLUTION_TIMEOUT_SECS",
            #[allow(
                clippy::cast_precision_loss,
                reason = "timeout seconds are small positive integers well within f64 precision"
            )]
            {
                doi_resolution_timeout_secs as f64
            },
            1.0,
            120.0,
        )?;
        let enabled_providers = read_csv_set("SEARCH_PROVIDERS");
        let enable_free_apis = read_bool("ENABLE_FREE_APIS", true)?;
        let web_search_base_url = read_string("RA_WEB_SEARCH_BASE_URL").unwrap_or_else(|| DEFAULT_WEB_SEARCH_BASE_URL.to_string());
        let stats_agency_base_url = read_string("RA_STATS_AGENCY_BASE_URL").unwrap_or_else(|| DEFAULT_STATS_AGENCY_BASE_URL.to_string());
        Ok(Self {
            allowlist,
            denylist,
            max_response_bytes,
            request_timeout_ms,
            doi_resolution_timeout_secs,
            circuit_breaker: CircuitBreakerConfig::from_env()?,
            enabled_providers,
            enable_free_apis,
            web_search_base_url,
            stats_agency_base_url,
        })
    }

    /// Returns true when `provider_name` may be used under this policy.
    #[must_use]
    pub fn is_allowed(&self, provider_name: &str) -> bool {
        if self.denylist.contains(provider_name) {
            return false;
        }
        if self.allowlist.is_empty() {
            return true;
        }
        self.allowlist.contains(provider_name)
    }

    /// Returns true when `provider_name` is named in [`Self::enabled_providers`],
    /// or that set is empty (meaning "every builtin provider registers").
    #[must_use]
    pub fn is_enabled(&self, provider_name: &str) -> bool {
        self.enabled_providers.is_empty() || self.enabled_providers.contains(provider_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    fn base_fixture() -> ProviderConfig {
        ProviderConfig {
            allowlist: BTreeSet::new(),
            denylist: BTreeSet::new(),
            max_response_bytes: 1,
            request_timeout_ms: 1,
            doi_resolution_timeout_secs: 20,
            circuit_breaker: CircuitBreakerConfig::from_env().expect("defaults parse"),
            enabled_providers: BTreeSet::new(),
            enable_free_apis: true,
            web_search_base_url: DEFAULT_WEB_SEARCH_BASE_URL.to_string(),
            stats_agency_base_url: DEFAULT_STATS_AGENCY_BASE_URL.to_string(),
        }
    }

    #[test]
    fn empty_allowlist_permits_everything_not_denied() {
        let cfg = ProviderConfig { denylist: ["bad".to_string()].into_iter().collect(), ..base_fixture() };
        assert!(cfg.is_allowed("good"));
        assert!(!cfg.is_allowed("bad"));
    }

    #[test]
    fn nonempty_allowlist_restricts_to_named_providers() {
        let cfg = ProviderConfig { allowlist: ["only-this".to_string()].into_iter().collect(), ..base_fixture() };
        assert!(cfg.is_allowed("only-this"));
        assert!(!cfg.is_allowed("anything-else"));
    }

    #[test]
    fn empty_enabled_providers_means_every_builtin_registers() {
        let cfg = base_fixture();
        assert!(cfg.is_enabled("nps"));
    }

    #[test]
    fn nonempty_enabled_providers_restricts_registration() {
        let cfg = ProviderConfig { enabled_providers: ["web-search".to_string()].into_iter().collect(), ..base_fixture() };
        assert!(cfg.is_enabled("web-search"));
        assert!(!cfg.is_enabled("stats-agency"));
    }
}
