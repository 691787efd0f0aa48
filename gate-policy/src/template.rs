//! Violation message templates with placeholder substitution.

use std::fmt;

use gate_context::FieldPath;
use gate_primitives::{RuleId, Scalar};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while parsing a message template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template has no text.
    #[error("message template cannot be empty")]
    Empty,

    /// A `{name}` placeholder does not name a known substitution.
    #[error("unknown placeholder `{{{name}}}`")]
    UnknownPlaceholder {
        /// Name inside the braces.
        name: String,
    },
}

/// Substitutions available to a message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// Violating identifiers joined by `, `, strings unquoted.
    Violating,
    /// Violating identifiers as a JSON-style list.
    ViolatingJson,
    /// The permitted set, keyed by the rule's subject label.
    Allowed,
    /// The rule identifier.
    Rule,
    /// The rule's field path.
    Path,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "violating" => Some(Self::Violating),
            "violating_json" => Some(Self::ViolatingJson),
            "allowed" => Some(Self::Allowed),
            "rule" => Some(Self::Rule),
            "path" => Some(Self::Path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Placeholder(Placeholder),
}

/// Parsed violation message template.
///
/// Placeholders are written `{name}`; `%name%` is accepted as an alias. Known
/// names are `violating`, `violating_json`, `allowed`, `rule` and `path`. An
/// unknown `{name}` or `%name%` is rejected at parse time. Markers that do not
/// enclose an identifier, such as `100% of` or `{ x }`, are kept as literal text.
///
/// ```
/// use gate_policy::MessageTemplate;
///
/// let template = MessageTemplate::parse("Violating credentials: [{violating}]").unwrap();
/// assert_eq!(template.as_str(), "Violating credentials: [{violating}]");
/// assert!(MessageTemplate::parse("{nope}").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageTemplate {
    source: String,
    parts: Vec<Part>,
}

impl MessageTemplate {
    /// Parses template text.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Empty`] for blank text and
    /// [`TemplateError::UnknownPlaceholder`] for an unrecognised `{name}` or
    /// `%name%`.
    pub fn parse(text: impl Into<String>) -> TemplateResult<Self> {
        let source = text.into();
        if source.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = source.as_str();

        while let Some(pos) = rest.find(['{', '%']) {
            literal.push_str(&rest[..pos]);
            let open = if rest[pos..].starts_with('{') { '{' } else { '%' };
            let close = if open == '{' { '}' } else { '%' };
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];

            if !name.is_empty() && after[name_len..].starts_with(close) {
                match Placeholder::from_name(name) {
                    Some(placeholder) => {
                        if !literal.is_empty() {
                            parts.push(Part::Literal(std::mem::take(&mut literal)));
                        }
                        parts.push(Part::Placeholder(placeholder));
                        rest = &after[name_len + 1..];
                        continue;
                    }
                    None => {
                        return Err(TemplateError::UnknownPlaceholder {
                            name: name.to_owned(),
                        });
                    }
                }
            }

            literal.push(open);
            rest = after;
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self { source, parts })
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn render(&self, vars: &MessageVars<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Placeholder(Placeholder::Violating) => {
                    out.push_str(&display_list(vars.violating));
                }
                Part::Placeholder(Placeholder::ViolatingJson) => {
                    out.push_str(&json_list(vars.violating));
                }
                Part::Placeholder(Placeholder::Allowed) => {
                    if let Some((label, allowed)) = vars.allowed {
                        out.push_str(&allowed_map(label, allowed));
                    }
                }
                Part::Placeholder(Placeholder::Rule) => out.push_str(vars.rule.as_str()),
                Part::Placeholder(Placeholder::Path) => out.push_str(&vars.path.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for MessageTemplate {
    type Error = TemplateError;

    fn try_from(value: String) -> TemplateResult<Self> {
        Self::parse(value)
    }
}

impl From<MessageTemplate> for String {
    fn from(value: MessageTemplate) -> Self {
        value.source
    }
}

/// Values substituted into a template when a rule fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MessageVars<'a> {
    pub(crate) rule: &'a RuleId,
    pub(crate) path: &'a FieldPath,
    pub(crate) violating: &'a [Value],
    pub(crate) allowed: Option<(&'a str, &'a [Scalar])>,
}

fn display_item(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn display_list(values: &[Value]) -> String {
    values.iter().map(display_item).collect::<Vec<_>>().join(", ")
}

fn json_list(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn allowed_map(label: &str, allowed: &[Scalar]) -> String {
    let items: Vec<String> = allowed.iter().map(Scalar::to_json).collect();
    format!(
        "{{{}: [{}]}}",
        Value::String(label.to_owned()),
        items.join(", ")
    )
}
