//! Immutable launch payload supplied by the host platform.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContextError, ContextResult};

const EXTRA_VARS: &str = "extra_vars";
const CREDENTIALS: &str = "credentials";

/// Structured payload describing one job launch request.
///
/// Always a JSON object at the top level. Once built it is never mutated, so a
/// single context can be shared by every rule evaluated against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct LaunchContext {
    root: Value,
}

impl LaunchContext {
    /// Creates a context from a JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            root: Value::Object(map),
        }
    }

    /// Parses a context from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Json`] for invalid JSON and
    /// [`ContextError::NotAnObject`] when the document is not an object.
    pub fn from_json_str(text: &str) -> ContextResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::try_from(value)
    }

    /// Returns a builder for assembling a context field by field.
    #[must_use]
    pub fn builder() -> LaunchContextBuilder {
        LaunchContextBuilder::default()
    }

    /// Returns the whole payload as a JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Returns a top-level field, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Returns the launch variables, treating an absent or non-object
    /// `extra_vars` field as empty.
    #[must_use]
    pub fn extra_vars(&self) -> &Map<String, Value> {
        static EMPTY: OnceLock<Map<String, Value>> = OnceLock::new();
        self.get(EXTRA_VARS)
            .and_then(Value::as_object)
            .unwrap_or_else(|| EMPTY.get_or_init(Map::new))
    }

    /// Returns the referenced credentials, treating an absent or non-array
    /// `credentials` field as empty.
    #[must_use]
    pub fn credentials(&self) -> &[Value] {
        self.get(CREDENTIALS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl TryFrom<Value> for LaunchContext {
    type Error = ContextError;

    fn try_from(value: Value) -> ContextResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(ContextError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }
}

impl From<LaunchContext> for Value {
    fn from(value: LaunchContext) -> Self {
        value.root
    }
}

impl Default for LaunchContext {
    fn default() -> Self {
        Self::from_map(Map::new())
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builder assembling a [`LaunchContext`] before it is frozen.
#[derive(Debug, Default)]
pub struct LaunchContextBuilder {
    root: Map<String, Value>,
}

impl LaunchContextBuilder {
    /// Sets a top-level field, replacing any previous value.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.root.insert(key.into(), value);
        self
    }

    /// Adds one launch variable under `extra_vars`.
    #[must_use]
    pub fn extra_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let vars = self
            .root
            .entry(EXTRA_VARS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !vars.is_object() {
            *vars = Value::Object(Map::new());
        }
        if let Value::Object(vars) = vars {
            vars.insert(key.into(), value.into());
        }
        self
    }

    /// Appends one credential entry under `credentials`.
    #[must_use]
    pub fn credential(mut self, credential: Value) -> Self {
        let credentials = self
            .root
            .entry(CREDENTIALS)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !credentials.is_array() {
            *credentials = Value::Array(Vec::new());
        }
        if let Value::Array(credentials) = credentials {
            credentials.push(credential);
        }
        self
    }

    /// Freezes the builder into a context.
    #[must_use]
    pub fn build(self) -> LaunchContext {
        LaunchContext::from_map(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_assembles_payload() {
        let ctx = LaunchContext::builder()
            .extra_var("deploy_env", "staging")
            .extra_var("replicas", 3)
            .credential(json!({"name": "Demo Credential", "organization": null}))
            .field("job_template", json!("site.yml"))
            .build();

        assert_eq!(
            ctx.as_value(),
            &json!({
                "extra_vars": {"deploy_env": "staging", "replicas": 3},
                "credentials": [{"name": "Demo Credential", "organization": null}],
                "job_template": "site.yml"
            })
        );
        assert_eq!(ctx.extra_vars().len(), 2);
        assert_eq!(ctx.credentials().len(), 1);
    }

    #[test]
    fn absent_sections_default_to_empty() {
        let ctx = LaunchContext::builder().build();
        assert!(ctx.extra_vars().is_empty());
        assert!(ctx.credentials().is_empty());

        let odd = LaunchContext::from_json_str(r#"{"extra_vars": [1], "credentials": {}}"#)
            .unwrap();
        assert!(odd.extra_vars().is_empty());
        assert!(odd.credentials().is_empty());
    }

    #[test]
    fn rejects_non_object_payloads() {
        let err = LaunchContext::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ContextError::NotAnObject { found: "array" }));

        let err = LaunchContext::from_json_str("{").unwrap_err();
        assert!(matches!(err, ContextError::Json { .. }));

        assert!(serde_json::from_value::<LaunchContext>(json!("text")).is_err());
    }

    #[test]
    fn serializes_as_plain_object() {
        let ctx = LaunchContext::builder().extra_var("k", "v").build();
        let text = serde_json::to_string(&ctx).unwrap();
        assert_eq!(text, r#"{"extra_vars":{"k":"v"}}"#);
        let back: LaunchContext = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ctx);
    }
}
