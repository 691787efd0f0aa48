//! Boundary with external policy compilers.
//!
//! Author-facing policy languages live outside this crate. They hand over
//! normalized [`RuleDeclaration`]s, which are validated here into a [`RuleSet`].
//! A set compiles completely or not at all: one malformed declaration fails the
//! whole set.

use gate_context::{ContextError, FieldPath};
use gate_primitives::{RuleId, Scalar};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::rule::{DEFAULT_IDENTIFIER_KEY, Predicate, PredicateKind, ReportAs, Rule};
use crate::ruleset::RuleSet;
use crate::template::{MessageTemplate, TemplateError};

/// Errors raised while compiling rule declarations.
///
/// `rule` names the declaration by id, or by `#index` when the id itself is
/// unusable.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The declaration's id failed validation.
    #[error("rule {rule}: {source}")]
    InvalidRuleId {
        /// Declaration label.
        rule: String,
        /// Underlying validation error.
        #[source]
        source: gate_primitives::Error,
    },
    /// The predicate kind is not one the evaluator understands.
    #[error("rule `{rule}`: unknown predicate kind `{kind}`")]
    UnknownPredicate {
        /// Declaration label.
        rule: String,
        /// Rejected kind name.
        kind: String,
    },
    /// The field path could not be parsed.
    #[error("rule `{rule}`: {source}")]
    MalformedPath {
        /// Declaration label.
        rule: String,
        /// Underlying parse error.
        #[source]
        source: ContextError,
    },
    /// A parameter the predicate requires was not supplied.
    #[error("rule `{rule}`: missing required parameter `{parameter}`")]
    MissingParameter {
        /// Declaration label.
        rule: String,
        /// Name of the missing parameter.
        parameter: &'static str,
    },
    /// A parameter was supplied with an unusable value, or is unknown.
    #[error("rule `{rule}`: invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Declaration label.
        rule: String,
        /// Name of the offending parameter.
        parameter: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
    /// The message template could not be parsed.
    #[error("rule `{rule}`: {source}")]
    InvalidTemplate {
        /// Declaration label.
        rule: String,
        /// Underlying template error.
        #[source]
        source: TemplateError,
    },
    /// Two rules in one set share an id.
    #[error("duplicate rule id `{rule}`")]
    DuplicateRuleId {
        /// The repeated id.
        rule: String,
    },
    /// The declaration document was not valid JSON of the expected shape.
    #[error("invalid rule declarations: {source}")]
    Json {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

/// Result alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Normalized, author-independent description of one rule.
///
/// ```json
/// {
///   "id": "credential-org",
///   "fieldPath": "credentials[*].organization",
///   "predicateKind": "fieldMustNotBeNull",
///   "parameters": { "identifiedBy": "name" },
///   "messageTemplate": "Violating credentials: [{violating}]"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleDeclaration {
    /// Unique rule id.
    pub id: String,
    /// Field path text, e.g. `extra_vars.deploy_env`.
    pub field_path: String,
    /// Predicate kind name, e.g. `valueAllowList`.
    pub predicate_kind: String,
    /// Predicate-specific parameters.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
    /// Message rendered when the rule fails.
    pub message_template: String,
}

impl RuleDeclaration {
    /// Compiles this declaration into a rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] found in the declaration.
    pub fn compile(&self) -> CompileResult<Rule> {
        self.compile_labelled(&self.id)
    }

    fn compile_labelled(&self, label: &str) -> CompileResult<Rule> {
        let rule = || label.to_owned();

        let id = RuleId::new(self.id.clone()).map_err(|source| CompileError::InvalidRuleId {
            rule: rule(),
            source,
        })?;
        let path = FieldPath::parse(&self.field_path)
            .map_err(|source| CompileError::MalformedPath { rule: rule(), source })?;
        let kind = PredicateKind::from_name(&self.predicate_kind).ok_or_else(|| {
            CompileError::UnknownPredicate {
                rule: rule(),
                kind: self.predicate_kind.clone(),
            }
        })?;
        let predicate = match kind {
            PredicateKind::ValueAllowList => allow_list_from(label, &self.parameters)?,
            PredicateKind::FieldMustNotBeNull => null_check_from(label, &self.parameters)?,
        };
        let message = MessageTemplate::parse(self.message_template.clone())
            .map_err(|source| CompileError::InvalidTemplate { rule: rule(), source })?;

        Ok(Rule::new(id, path, predicate, message))
    }
}

fn invalid(rule: &str, parameter: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidParameter {
        rule: rule.to_owned(),
        parameter: parameter.to_owned(),
        reason: reason.into(),
    }
}

fn reject_unknown(rule: &str, parameters: &Map<String, Value>, known: &[&str]) -> CompileResult<()> {
    match parameters.keys().find(|key| !known.contains(&key.as_str())) {
        Some(unknown) => Err(invalid(rule, unknown, "unknown parameter")),
        None => Ok(()),
    }
}

fn allow_list_from(rule: &str, parameters: &Map<String, Value>) -> CompileResult<Predicate> {
    reject_unknown(rule, parameters, &["allowedValues", "report"])?;

    let values = parameters
        .get("allowedValues")
        .ok_or_else(|| CompileError::MissingParameter {
            rule: rule.to_owned(),
            parameter: "allowedValues",
        })?
        .as_array()
        .ok_or_else(|| invalid(rule, "allowedValues", "expected an array of scalars"))?;

    let mut allowed = Vec::with_capacity(values.len());
    for value in values {
        let scalar = Scalar::try_from(value.clone())
            .map_err(|err| invalid(rule, "allowedValues", err.to_string()))?;
        allowed.push(scalar);
    }

    let report = match parameters.get("report") {
        None => ReportAs::default(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|_| invalid(rule, "report", "expected `value` or `key`"))?,
    };

    Ok(Predicate::value_allow_list(allowed).reporting(report))
}

fn null_check_from(rule: &str, parameters: &Map<String, Value>) -> CompileResult<Predicate> {
    reject_unknown(rule, parameters, &["identifiedBy"])?;

    let key = match parameters.get("identifiedBy") {
        None => DEFAULT_IDENTIFIER_KEY,
        Some(Value::String(key)) if !key.is_empty() => key.as_str(),
        Some(_) => return Err(invalid(rule, "identifiedBy", "expected a non-empty string")),
    };

    Ok(Predicate::field_must_not_be_null().identified_by(key))
}

/// Compiles declarations into a rule set, keeping their order.
///
/// # Errors
///
/// Returns the first [`CompileError`]; no partial set is produced.
pub fn compile_declarations(declarations: &[RuleDeclaration]) -> CompileResult<RuleSet> {
    let mut rules = Vec::with_capacity(declarations.len());
    for (index, declaration) in declarations.iter().enumerate() {
        let label = if declaration.id.trim().is_empty() {
            format!("#{index}")
        } else {
            declaration.id.clone()
        };
        rules.push(declaration.compile_labelled(&label)?);
    }

    let rule_set = RuleSet::new(rules)?;
    debug!(rules = rule_set.len(), "rule declarations compiled");
    Ok(rule_set)
}

/// Trait implemented by policy compilers feeding the evaluator.
pub trait RuleCompiler: Send + Sync {
    /// Compiles an author-facing policy document into a rule set.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] when any part of the policy is invalid.
    fn compile(&self, policy: &str) -> CompileResult<RuleSet>;
}

/// Compiler for documents that are already a JSON array of [`RuleDeclaration`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationCompiler;

impl RuleCompiler for DeclarationCompiler {
    fn compile(&self, policy: &str) -> CompileResult<RuleSet> {
        let declarations: Vec<RuleDeclaration> = serde_json::from_str(policy)?;
        compile_declarations(&declarations)
    }
}
