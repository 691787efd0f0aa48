//! Observability helpers for launch governance.
//!
//! [`init_tracing`] installs the process-wide `tracing` subscriber;
//! [`record_decision`] emits the structured event operators search for when a
//! launch is blocked.

#![warn(missing_docs, clippy::pedantic)]

use std::io;

use gate_policy::Decision;
use gate_primitives::RequestId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser explanation.
        reason: String,
    },
    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialized: {reason}")]
    AlreadyInitialized {
        /// Explanation from `tracing-subscriber`.
        reason: String,
    },
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// Whether events include their target module.
    pub with_target: bool,
    /// Whether to use the compact single-line format.
    pub compact: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            with_target: false,
            compact: false,
        }
    }
}

impl TelemetryConfig {
    /// Builds the filter: `RUST_LOG` if it parses, otherwise [`Self::filter`].
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] when the configured directive is
    /// invalid and `RUST_LOG` does not supply a usable one.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .map_err(|err| TelemetryError::InvalidFilter {
                filter: self.filter.clone(),
                reason: err.to_string(),
            })
    }
}

/// Installs a `fmt` subscriber configured by `config`.
///
/// Events are written to stderr so stdout stays free for command output.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for an unusable filter and
/// [`TelemetryError::AlreadyInitialized`] when a global subscriber exists.
pub fn init_tracing(config: &TelemetryConfig) -> TelemetryResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.with_target)
        .with_writer(io::stderr);

    let installed = if config.compact {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|err| TelemetryError::AlreadyInitialized {
        reason: err.to_string(),
    })
}

/// Logs the outcome of one launch decision.
///
/// Allowed launches are logged at `info`, denied ones at `warn` with every
/// violation message.
pub fn record_decision(request_id: RequestId, decision: &Decision) {
    if decision.is_allowed() {
        info!(request_id = %request_id, "launch allowed");
    } else {
        warn!(
            request_id = %request_id,
            violations = decision.violations().len(),
            messages = ?decision.violations(),
            "launch denied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        let config: TelemetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TelemetryConfig::default());

        let config: TelemetryConfig =
            serde_json::from_str(r#"{"filter": "gate_policy=debug", "compact": true}"#).unwrap();
        assert_eq!(config.filter, "gate_policy=debug");
        assert!(config.compact);
        assert!(!config.with_target);

        assert!(serde_json::from_str::<TelemetryConfig>(r#"{"level": "info"}"#).is_err());
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let config = TelemetryConfig {
            filter: "warn".into(),
            ..TelemetryConfig::default()
        };
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        assert!(first.is_ok() || matches!(first, Err(TelemetryError::AlreadyInitialized { .. })));
        assert!(matches!(
            second,
            Err(TelemetryError::AlreadyInitialized { .. })
        ));
    }

    #[test]
    fn record_decision_accepts_both_outcomes() {
        record_decision(RequestId::random(), &Decision::allow());
        record_decision(RequestId::random(), &Decision::from_messages(["blocked"]));
    }
}
