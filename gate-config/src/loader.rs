//! Reading configuration documents from strings and files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::GateConfig;

impl GateConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, unknown fields, or a
    /// zero `max_concurrency`.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        debug!(
            path = %path.display(),
            extra_vars = config.extra_vars.allowed_values.len(),
            rules = config.rules.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    #[test]
    fn empty_document_uses_defaults() {
        let config = GateConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GateConfig::default());
    }

    #[test]
    fn rejects_unknown_sections_and_fields() {
        assert!(matches!(
            GateConfig::from_json_str(r#"{"engines": {}}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(GateConfig::from_json_str(r#"{"engine": {"workers": 2}}"#).is_err());
        assert!(GateConfig::from_json_str(r#"{"engine": {"max_concurrency": 0}}"#).is_err());
    }

    #[test]
    fn load_reads_files() {
        let path = env::temp_dir().join(format!("gate-config-{}.json", process::id()));
        fs::write(&path, r#"{"credentials": {"require_organization": true}}"#).unwrap();
        let config = GateConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(config.credentials.require_organization);
    }

    #[test]
    fn load_reports_missing_files() {
        let err = GateConfig::load("/nonexistent/gate-config.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/gate-config.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
