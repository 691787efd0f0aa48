//! Shared error definitions for governance primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the governance crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided request identifier could not be parsed.
    #[error("invalid request id: {source}")]
    InvalidRequestId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Rule identifier failed validation.
    #[error("invalid rule id `{id}`: {reason}")]
    InvalidRuleId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A value that must be a string, number, or boolean was something else.
    #[error("expected a scalar value, found {found}")]
    NotAScalar {
        /// JSON type name of the rejected value.
        found: &'static str,
    },
}
