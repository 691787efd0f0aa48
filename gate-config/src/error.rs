//! Error types for configuration loading.

use std::path::PathBuf;

use gate_policy::CompileError;
use thiserror::Error;

/// Errors raised while loading a configuration or building from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not a valid configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configured rules do not compile.
    #[error("invalid policy: {0}")]
    Policy(#[from] CompileError),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
