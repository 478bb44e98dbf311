// crates/research-config/src/env.rs
// ============================================================================
// Module: Environment Value Parsing
// Description: Small typed readers over std::env, shared by every config
//              section.
// Purpose: Centralize parse-and-validate-once logic so only this crate
//          reads process environment variables.
// Dependencies: crate::error
// ============================================================================

//! ## Overview
//! Every other stage of the pipeline receives a fully-built config value;
//! only this module (plus provider API-key lookups, which are intentionally
//! lazy per-call) touches [`std::env`] directly.

use std::collections::BTreeSet;

use crate::error::ConfigError;

/// Reads an optional string environment variable, treating an empty value
/// as absent.
#[must_use]
pub fn read_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Reads a comma-separated environment variable into a set of trimmed,
/// non-empty entries. Unset or empty yields an empty set.
#[must_use]
pub fn read_csv_set(key: &str) -> BTreeSet<String> {
    read_string(key).map(|raw| parse_csv_set(&raw)).unwrap_or_default()
}

/// Splits `raw` on commas into a set of trimmed, non-empty entries.
#[must_use]
fn parse_csv_set(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a required string environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingRequired`] when `key` is unset or empty.
pub fn require_string(key: &str) -> Result<String, ConfigError> {
    read_string(key).ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
}

/// Reads an environment variable as `f64`, falling back to `default` when
/// unset.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] when the variable is set but does
/// not parse as a finite `f64`.
pub fn read_f64(key: &str, default: f64) -> Result<f64, ConfigError> {
    match read_string(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a finite number, got {raw:?}"),
            }),
    }
}

/// Reads an environment variable as `u64`, falling back to `default` when
/// unset.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] when the variable is set but does
/// not parse as a `u64`.
pub fn read_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match read_string(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got {raw:?}"),
        }),
    }
}

/// Reads an environment variable as `bool`, accepting `1`/`0`/`true`/`false`
/// case-insensitively, falling back to `default` when unset.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] for any other value.
pub fn read_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match read_string(key) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected true/false/1/0, got {raw:?}"),
            }),
        },
    }
}

/// Validates that `value` lies within `[min, max]`, for fields that accept
/// either an explicit value or a derived default.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] when `value` falls outside the
/// range.
pub fn validate_range(key: &str, value: f64, min: f64, max: f64) -> Result<f64, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a value in [{min}, {max}], got {value}"),
        })
    }
}
