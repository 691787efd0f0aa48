//! Deterministic governance rule evaluation for job launches.
//!
//! Depend on this crate via `cargo add launch-gate`. It bundles the internal
//! crates; configuration loading and tracing setup sit behind the `config` and
//! `telemetry` feature flags for hosts that bring their own.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use gate_primitives as primitives;

/// Launch payloads, field paths, and path resolution.
pub use gate_context as context;

/// Rules, evaluation, and decisions.
pub use gate_policy as policy;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use gate_config as config;

/// Tracing setup and decision logging (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use gate_telemetry as telemetry;

pub use gate_context::LaunchContext;
pub use gate_policy::{Decision, DecisionEngine, LaunchRequest, Rule, RuleSet, Violation, decide};
