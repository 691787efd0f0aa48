//! Core shared types for launch-time governance checks.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod scalar;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifiers for rules and launch requests.
pub use ids::{RequestId, RuleId};
/// Scalar values usable in allow-lists.
pub use scalar::Scalar;
