// crates/research-providers/src/lib.rs
// ============================================================================
// Module: Research Providers
// Description: Circuit-breaker-guarded provider registry and built-in
//              evidence source adapters.
// Purpose: Turn research-core's Provider trait into working, hardened HTTP
//          clients the dispatcher can fan out to.
// Dependencies: research-core, research-config, reqwest, tokio, async-trait
// ============================================================================

//! ## Overview
//! This crate is where research-core's capability traits meet the network.
//! [`registry::ProviderRegistry`] owns every registered provider and its
//! circuit breaker; [`builtin`] ships two concrete adapters; [`http`] is the
//! hardened fetch path both adapters (and research-pipeline's enrichment
//! stage) use; [`clock`] is the narrow wall-clock seam the breaker needs.

pub mod builtin;
pub mod circuit;
pub mod clock;
pub mod env;
pub mod http;
pub mod registry;

pub use builtin::JsonSearchProvider;
pub use circuit::CircuitBreaker;
pub use clock::Clock;
pub use clock::SystemClock;
pub use env::lookup_api_key;
pub use http::HttpFetchConfig;
pub use http::HttpFetchError;
pub use http::fetch_pinned;
pub use http::is_private_or_link_local;
pub use http::resolve_final_url;
pub use registry::ProviderRegistry;
