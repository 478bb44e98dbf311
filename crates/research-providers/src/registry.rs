// crates/research-providers/src/registry.rs
// ============================================================================
// Module: Provider Registry
// Description: Named, access-controlled, circuit-breaker-wrapped provider
//              lookup.
// Purpose: Give research-dispatch one place to list, select, and call
//          providers without knowing how each is implemented.
// Dependencies: research_core::Provider, research_config::ProviderConfig,
//               crate::circuit, crate::clock
// ============================================================================

//! ## Overview
//! The registry owns every registered [`Provider`] plus a dedicated
//! [`CircuitBreaker`] per provider name. Registration is a one-time startup
//! step; after that, the registry is read-only except for breaker state,
//! which providers record through as they are called.

use std::collections::BTreeMap;
use std::sync::Mutex;

use research_config::ProviderConfig;
use research_core::Provider;
use research_core::ProviderState;
use research_core::RunRng;

use crate::circuit::CircuitBreaker;
use crate::clock::Clock;
use crate::clock::SystemClock;

/// One registered provider plus its dedicated circuit breaker.
struct RegisteredProvider {
    /// The provider implementation.
    provider: Box<dyn Provider + Send + Sync>,
    /// Per-provider failure tracking.
    breaker: CircuitBreaker,
}

/// A named, access-controlled collection of evidence providers.
pub struct ProviderRegistry {
    /// Registered providers, keyed by stable provider name.
    providers: BTreeMap<String, RegisteredProvider>,
    /// Which providers are permitted to run.
    policy: ProviderConfig,
    /// Clock used for breaker availability checks.
    clock: Box<dyn Clock>,
    /// Deterministic RNG used for breaker backoff jitter.
    rng: Mutex<RunRng>,
}

impl ProviderRegistry {
    /// Creates an empty registry bound to `policy` and seeded from
    /// `seed_str` for backoff jitter.
    #[must_use]
    pub fn new(policy: ProviderConfig, seed_str: &str) -> Self {
        Self {
            providers: BTreeMap::new(),
            policy,
            clock: Box::new(SystemClock),
            rng: Mutex::new(RunRng::from_seed_str(seed_str)),
        }
    }

    /// Registers `provider` under its own [`Provider::name`], giving it a
    /// fresh circuit breaker using `breaker_config`.
    pub fn register(&mut self, provider: Box<dyn Provider + Send + Sync>, breaker_config: research_config::CircuitBreakerConfig) {
        let name = provider.name().to_string();
        self.providers.insert(
            name,
            RegisteredProvider {
                provider,
                breaker: CircuitBreaker::new(breaker_config),
            },
        );
    }

    /// Returns the names of providers that are both policy-allowed and
    /// currently available (not backed off or circuit-open).
    #[must_use]
    pub fn available_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|(name, entry)| self.policy.is_allowed(name) && entry.breaker.is_available(self.clock.as_ref()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Looks up a registered, policy-allowed provider by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&(dyn Provider + Send + Sync)> {
        if !self.policy.is_allowed(name) {
            return None;
        }
        self.providers.get(name).map(|entry| entry.provider.as_ref())
    }

    /// True when `name` is both registered and currently available.
    #[must_use]
    pub fn is_available(&self, name: &str) -> bool {
        self.policy.is_allowed(name)
            && self
                .providers
                .get(name)
                .is_some_and(|entry| entry.breaker.is_available(self.clock.as_ref()))
    }

    /// Records a successful call against `name`'s breaker.
    pub fn record_success(&self, name: &str) {
        if let Some(entry) = self.providers.get(name) {
            entry.breaker.record_success();
        }
    }

    /// Records a failed call against `name`'s breaker.
    pub fn record_failure(&self, name: &str, status_code: Option<u16>) {
        if let Some(entry) = self.providers.get(name) {
            let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            entry.breaker.record_failure(self.clock.as_ref(), &mut rng, status_code);
        }
    }

    /// Returns a health snapshot per registered provider, for the run
    /// metrics artifact.
    #[must_use]
    pub fn health_stats(&self) -> BTreeMap<String, ProviderState> {
        self.providers
            .iter()
            .map(|(name, entry)| (name.clone(), entry.breaker.snapshot()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use research_config::CircuitBreakerConfig;
    use research_core::Intent;
    use research_core::ProviderError;
    use research_core::ProviderHit;
    use research_core::ProviderKind;
    use research_core::ProviderQuery;

    use super::*;

    struct StubProvider {
        name: &'static str,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Search
        }

        async fn query(&self, _query: &ProviderQuery) -> Result<Vec<ProviderHit>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn breaker_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            cooldown_seconds: 600,
            initial_backoff: std::time::Duration::from_secs(5),
            max_backoff: std::time::Duration::from_secs(300),
        }
    }

    fn policy() -> ProviderConfig {
        ProviderConfig {
            allowlist: BTreeSet::new(),
            denylist: BTreeSet::new(),
            max_response_bytes: 1,
            request_timeout_ms: 1,
            doi_resolution_timeout_secs: 20,
            circuit_breaker: breaker_config(),
            enabled_providers: BTreeSet::new(),
            enable_free_apis: true,
            web_search_base_url: "https://api.web-search.invalid".to_string(),
            stats_agency_base_url: "https://api.stats-agency.invalid".to_string(),
        }
    }

    #[test]
    fn registered_provider_is_available_by_default() {
        let mut registry = ProviderRegistry::new(policy(), "seed");
        registry.register(Box::new(StubProvider { name: "stub" }), breaker_config());
        assert!(registry.is_available("stub"));
        assert!(registry.get("stub").is_some());
    }

    #[test]
    fn denied_provider_is_unavailable_even_if_registered() {
        let mut cfg = policy();
        cfg.denylist.insert("stub".to_string());
        let mut registry = ProviderRegistry::new(cfg, "seed");
        registry.register(Box::new(StubProvider { name: "stub" }), breaker_config());
        assert!(!registry.is_available("stub"));
        assert!(registry.get("stub").is_none());
    }

    #[test]
    fn repeated_failures_remove_provider_from_available_list() {
        let mut registry = ProviderRegistry::new(policy(), "seed");
        registry.register(Box::new(StubProvider { name: "stub" }), breaker_config());
        for _ in 0..3 {
            registry.record_failure("stub", None);
        }
        assert!(registry.available_providers().is_empty());
    }

    #[test]
    fn unknown_query_intent_field_compiles_for_future_providers() {
        let query = ProviderQuery {
            text: "x".to_string(),
            max_results: 1,
            intent: Intent::Generic,
            subtopic_name: None,
        };
        assert_eq!(query.max_results, 1);
    }
}
