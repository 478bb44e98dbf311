// crates/research-core/src/error.rs
// ============================================================================
// Module: Research Core Errors
// Description: Shared error taxonomy for pipeline stages.
// Purpose: Classify failures per the transient/rate-limit/validation/
//          deadline taxonomy the run error-handling design follows.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! One error enum per the taxonomy a run needs to distinguish: provider
//! failures never abort a run, validation failures route records to the
//! errors file, and deadline expiry triggers a partial write. Stages
//! classify their own failures; only the CLI turns them into exit codes.

use thiserror::Error;

/// Errors surfaced by pipeline stages.
///
/// # Invariants
/// - Variants are stable for programmatic handling by the CLI's exit-code
///   mapping.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A record failed schema validation and was routed to the errors file.
    #[error("evidence validation failed: {0}")]
    Validation(String),
    /// An I/O failure while reading or writing run-directory artifacts.
    #[error("run directory io error: {0}")]
    Io(String),
    /// The overall run deadline expired before the pipeline completed.
    #[error("run deadline exceeded")]
    DeadlineExceeded,
    /// A configuration value failed validation at load time.
    #[error("configuration error: {0}")]
    Config(String),
    /// Report rendering failed; the evidence bundle is still persisted.
    #[error("report rendering failed: {0}")]
    Rendering(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}
