//! Configuration for launch governance.
//!
//! A [`GateConfig`] document selects the canonical checks, adds authored rule
//! declarations, and chooses how decisions are evaluated:
//!
//! ```json
//! {
//!   "engine": { "mode": "parallel", "max_concurrency": 4 },
//!   "extra_vars": { "allowed_values": { "extra_var_key": ["allowed_value1", "allowed_value2"] } },
//!   "credentials": { "require_organization": true },
//!   "rules": [],
//!   "telemetry": { "filter": "info" }
//! }
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{CredentialsPolicy, EngineMode, EngineSettings, ExtraVarsPolicy, GateConfig};
