//! Error types for context construction and path parsing.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted while building contexts or parsing field paths.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Field path text could not be parsed.
    #[error("malformed field path `{path}`: {reason}")]
    MalformedPath {
        /// The rejected path text.
        path: String,
        /// Human-readable reason for rejection.
        reason: &'static str,
    },
    /// A launch context must be a JSON object at the top level.
    #[error("launch context must be an object, found {found}")]
    NotAnObject {
        /// JSON type name of the rejected document.
        found: &'static str,
    },
    /// The launch payload was not valid JSON.
    #[error("invalid launch payload: {source}")]
    Json {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
}

impl ContextError {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        Self::MalformedPath {
            path: path.to_owned(),
            reason,
        }
    }
}

/// Result type alias for context operations.
pub type ContextResult<T> = Result<T, ContextError>;
