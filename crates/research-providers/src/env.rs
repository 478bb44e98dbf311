// crates/research-providers/src/env.rs
// ============================================================================
// Module: Provider Credential Lookup
// Description: Lazy, per-call environment reads for provider API keys.
// Purpose: Let a missing credential degrade a single provider to "skipped"
//          rather than failing run startup.
// Dependencies: std::env
// ============================================================================

//! ## Overview
//! Unlike [`research_config`], which reads every other setting eagerly at
//! startup, provider credentials are looked up lazily, once per provider
//! construction, because a missing key is not a misconfiguration of the
//! run as a whole — it just means that one provider contributes nothing.

/// Reads a provider API key, treating an unset or empty value as "no key".
#[must_use]
pub fn lookup_api_key(env_var: &str) -> Option<String> {
    std::env::var(env_var).ok().filter(|v| !v.trim().is_empty())
}
