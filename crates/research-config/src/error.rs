// crates/research-config/src/error.rs
// ============================================================================
// Module: Config Errors
// Description: Failure modes for configuration loading and validation.
// Purpose: Let the CLI map a bad environment/config value to exit code 2
//          before any provider call is made.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Configuration is validated eagerly, once, at startup. Every failure here
//! is a misconfiguration the operator can fix without re-running anything.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing required environment variable: {0}")]
    MissingRequired(String),
    /// An environment variable was present but failed to parse or validate.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// The environment variable or config key in question.
        key: String,
        /// A human-readable description of why the value was rejected.
        message: String,
    },
    /// A config file could not be read or parsed.
    #[error("failed to load config file: {0}")]
    Load(String),
}
