// crates/research-dispatch/src/dispatcher.rs
// ============================================================================
// Module: Parallel Dispatcher
// Description: Deadline-bounded, per-provider-isolated concurrent fan-out.
// Purpose: Query every planned (provider, query) pair concurrently, without
//          one slow or hung provider delaying the rest, and feed each
//          outcome back into the provider's own circuit breaker.
// Dependencies: tokio, research_core::traits, research_providers::registry
// ============================================================================

//! ## Overview
//! This is the async, tokio-based analog of a synchronous composite
//! broker's fan-out: every request gets its own task, a per-call timeout
//! bounds an individual hung provider, and an overall deadline bounds the
//! whole batch. A provider that times out or errors is recorded against its
//! own breaker and reported back as a normal (failed) outcome — dispatch
//! itself only fails when nothing was submitted or the deadline elapsed
//! before every task finished.

use std::sync::Arc;
use std::time::Duration;

use research_core::ProviderError;
use research_core::ProviderHit;
use research_core::ProviderQuery;
use research_providers::ProviderRegistry;
use tokio::task::JoinSet;

use crate::error::DispatchError;

/// One planned call: which provider to hit with which query.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Name of the provider to call, as registered.
    pub provider_name: String,
    /// The query to send.
    pub query: ProviderQuery,
}

/// The result of one dispatched call.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Provider the call was sent to.
    pub provider_name: String,
    /// Subtopic/facet name carried through from the originating query.
    pub subtopic_name: Option<String>,
    /// The provider's result, or the failure that prevented one.
    pub result: Result<Vec<ProviderHit>, ProviderError>,
}

/// Fans requests out across registered providers concurrently.
pub struct Dispatcher {
    /// Shared provider registry every task borrows from.
    registry: Arc<ProviderRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher bound to `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatches every request in `requests` concurrently, bounding each
    /// individual call to `per_call_timeout` and the whole batch to
    /// `overall_deadline`.
    ///
    /// # Errors
    /// Returns [`DispatchError::Empty`] when `requests` is empty, or
    /// [`DispatchError::DeadlineExceeded`] when `overall_deadline` elapses
    /// before every task finishes; outcomes gathered up to that point are
    /// returned alongside the error.
    pub async fn dispatch_all(
        &self,
        requests: Vec<DispatchRequest>,
        per_call_timeout: Duration,
        overall_deadline: Duration,
    ) -> Result<Vec<DispatchOutcome>, (Vec<DispatchOutcome>, DispatchError)> {
        let total = requests.len();
        if total == 0 {
            return Err((Vec::new(), DispatchError::Empty));
        }

        let mut tasks: JoinSet<DispatchOutcome> = JoinSet::new();
        for request in requests {
            let registry = Arc::clone(&self.registry);
            tasks.spawn(async move { run_one(registry, request, per_call_timeout).await });
        }

        let mut outcomes = Vec::with_capacity(total);
        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                if let Ok(outcome) = joined {
                    outcomes.push(outcome);
                }
            }
        };

        match tokio::time::timeout(overall_deadline, collect).await {
            Ok(()) => Ok(outcomes),
            Err(_) => {
                tasks.abort_all();
                let completed = outcomes.len();
                Err((outcomes, DispatchError::DeadlineExceeded { completed, total }))
            }
        }
    }
}

/// Runs a single dispatch request and records its outcome against the
/// provider's circuit breaker.
async fn run_one(registry: Arc<ProviderRegistry>, request: DispatchRequest, per_call_timeout: Duration) -> DispatchOutcome {
    let subtopic_name = request.query.subtopic_name.clone();
    let result = match registry.get(&request.provider_name) {
        None => Err(ProviderError::Unavailable),
        Some(provider) => match tokio::time::timeout(per_call_timeout, provider.query(&request.query)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Network("provider call timed out".to_string())),
        },
    };

    match &result {
        Ok(_) => registry.record_success(&request.provider_name),
        Err(ProviderError::NotConfigured | ProviderError::Unavailable) => {}
        Err(ProviderError::RateLimited { .. }) => registry.record_failure(&request.provider_name, Some(429)),
        Err(ProviderError::InvalidResponse(_) | ProviderError::Network(_)) => {
            registry.record_failure(&request.provider_name, None);
        }
    }

    DispatchOutcome {
        provider_name: request.provider_name,
        subtopic_name,
        result,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use research_config::CircuitBreakerConfig;
    use research_config::ProviderConfig;
    use research_core::Intent;
    use research_core::Provider;
    use research_core::ProviderKind;

    use super::*;

    struct InstantProvider;

    #[async_trait]
    impl Provider for InstantProvider {
        fn name(&self) -> &str {
            "instant"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Search
        }

        async fn query(&self, _query: &ProviderQuery) -> Result<Vec<ProviderHit>, ProviderError> {
            Ok(vec![ProviderHit {
                title: "t".to_string(),
                url: "https://example.com".to_string(),
                snippet: "s".to_string(),
                published_at: None,
                doi: None,
                raw_score: None,
            }])
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl Provider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Search
        }

        async fn query(&self, _query: &ProviderQuery) -> Result<Vec<ProviderHit>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    fn breaker_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            cooldown_seconds: 600,
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(300),
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

    fn sample_query() -> ProviderQuery {
        ProviderQuery {
            text: "q".to_string(),
            max_results: 5,
            intent: Intent::Generic,
            subtopic_name: Some("facet-1".to_string()),
        }
    }

    #[tokio::test]
    async fn dispatches_concurrently_and_records_success() {
        let mut registry = ProviderRegistry::new(policy(), "seed");
        registry.register(Box::new(InstantProvider), breaker_config());
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let outcomes = dispatcher
            .dispatch_all(
                vec![DispatchRequest {
                    provider_name: "instant".to_string(),
                    query: sample_query(),
                }],
                Duration::from_secs(5),
                Duration::from_secs(5),
            )
            .await
            .expect("dispatch succeeds");

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(outcomes[0].subtopic_name.as_deref(), Some("facet-1"));
    }

    #[tokio::test]
    async fn per_call_timeout_fails_just_that_provider() {
        let mut registry = ProviderRegistry::new(policy(), "seed");
        registry.register(Box::new(SlowProvider), breaker_config());
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let outcomes = dispatcher
            .dispatch_all(
                vec![DispatchRequest {
                    provider_name: "slow".to_string(),
                    query: sample_query(),
                }],
                Duration::from_millis(10),
                Duration::from_secs(5),
            )
            .await
            .expect("overall deadline not exceeded");

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_err());
    }

    #[tokio::test]
    async fn empty_request_list_is_an_error() {
        let registry = ProviderRegistry::new(policy(), "seed");
        let dispatcher = Dispatcher::new(Arc::new(registry));
        let result = dispatcher
            .dispatch_all(Vec::new(), Duration::from_secs(1), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err((_, DispatchError::Empty))));
    }
}
