//! # Operator Configuration
//!
//! Operator-level settings loaded from environment variables.
//!
//! The base requeue interval lives here and is threaded into the reconciler
//! at construction time, so tests can shrink it without touching process-wide
//! state.

use std::time::Duration;

use crate::constants::{DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_REQUEUE_SECS};

/// Operator-level configuration
///
/// All settings have sensible defaults and can be overridden via environment
/// variables.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Base requeue interval
    /// Classified retry delays are expressed as multiples of this duration
    pub requeue_duration: Duration,
    /// Requeue interval applied after an unclassified reconciliation error
    pub error_requeue_duration: Duration,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            requeue_duration: Duration::from_secs(DEFAULT_REQUEUE_SECS),
            error_requeue_duration: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            requeue_duration: Duration::from_secs(env_var_or_default(
                "REQUEUE_DURATION_SECS",
                DEFAULT_REQUEUE_SECS,
            )),
            error_requeue_duration: Duration::from_secs(env_var_or_default(
                "ERROR_REQUEUE_DURATION_SECS",
                DEFAULT_ERROR_REQUEUE_SECS,
            )),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }
}

fn env_var_or_default<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_or_default_str(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
