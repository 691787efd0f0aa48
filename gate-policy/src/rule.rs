//! Normalized governance rules.

use std::fmt;

use gate_context::{FieldPath, ResolvedValue};
use gate_primitives::{RuleId, Scalar};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::MessageTemplate;

/// Sibling key reported by null checks unless configured otherwise.
pub const DEFAULT_IDENTIFIER_KEY: &str = "name";

/// Closed set of predicate kinds understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredicateKind {
    /// Every resolved value must be a member of an allow-list.
    ValueAllowList,
    /// No resolved value may be `null`.
    FieldMustNotBeNull,
}

impl PredicateKind {
    /// Every supported kind, in documentation order.
    pub const ALL: [Self; 2] = [Self::ValueAllowList, Self::FieldMustNotBeNull];

    /// Returns the declaration name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValueAllowList => "valueAllowList",
            Self::FieldMustNotBeNull => "fieldMustNotBeNull",
        }
    }

    /// Looks a kind up by its declaration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an allow-list rule reports for each disallowed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAs {
    /// The disallowed value itself.
    #[default]
    Value,
    /// The key the disallowed value was found under.
    Key,
}

impl ReportAs {
    pub(crate) fn identify(self, resolved: &ResolvedValue<'_>) -> Value {
        match self {
            Self::Value => resolved.value().clone(),
            Self::Key => Value::String(
                resolved
                    .key()
                    .map_or_else(|| resolved.location().to_string(), str::to_owned),
            ),
        }
    }
}

/// Predicate applied to the values a rule's field path resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Resolved values must be members of `allowed_values`.
    ValueAllowList {
        /// Permitted scalars, deduplicated, in declaration order.
        allowed_values: Vec<Scalar>,
        /// Identifier reported for each disallowed value.
        report: ReportAs,
    },
    /// Resolved values must not be `null`.
    FieldMustNotBeNull {
        /// Sibling key naming the offending element (e.g. `name`).
        identified_by: String,
    },
}

impl Predicate {
    /// Builds an allow-list predicate reporting the disallowed values.
    #[must_use]
    pub fn value_allow_list<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        let mut allowed_values: Vec<Scalar> = Vec::new();
        for value in allowed {
            let value = value.into();
            if !allowed_values.contains(&value) {
                allowed_values.push(value);
            }
        }
        Self::ValueAllowList {
            allowed_values,
            report: ReportAs::Value,
        }
    }

    /// Builds a null check reporting the `name` sibling of each offending element.
    #[must_use]
    pub fn field_must_not_be_null() -> Self {
        Self::FieldMustNotBeNull {
            identified_by: DEFAULT_IDENTIFIER_KEY.to_owned(),
        }
    }

    /// Changes what an allow-list reports. No effect on other predicates.
    #[must_use]
    pub fn reporting(mut self, report_as: ReportAs) -> Self {
        if let Self::ValueAllowList { report, .. } = &mut self {
            *report = report_as;
        }
        self
    }

    /// Changes the sibling key a null check reports. No effect on other
    /// predicates or when `key` is empty.
    #[must_use]
    pub fn identified_by(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if let Self::FieldMustNotBeNull { identified_by } = &mut self {
            if !key.is_empty() {
                *identified_by = key;
            }
        }
        self
    }

    /// Returns the predicate kind.
    #[must_use]
    pub fn kind(&self) -> PredicateKind {
        match self {
            Self::ValueAllowList { .. } => PredicateKind::ValueAllowList,
            Self::FieldMustNotBeNull { .. } => PredicateKind::FieldMustNotBeNull,
        }
    }
}

/// One normalized governance constraint.
///
/// Immutable once built: a rule names the field it constrains, the predicate
/// applied to every value found there, and the message rendered on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    id: RuleId,
    path: FieldPath,
    predicate: Predicate,
    message: MessageTemplate,
}

impl Rule {
    /// Creates a rule from validated parts.
    #[must_use]
    pub fn new(id: RuleId, path: FieldPath, predicate: Predicate, message: MessageTemplate) -> Self {
        Self {
            id,
            path,
            predicate,
            message,
        }
    }

    /// Returns the rule identifier.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// Returns the field path the rule inspects.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the predicate.
    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Returns the predicate kind.
    #[must_use]
    pub fn kind(&self) -> PredicateKind {
        self.predicate.kind()
    }

    /// Returns the message template.
    #[must_use]
    pub fn message(&self) -> &MessageTemplate {
        &self.message
    }

    /// Label keying the permitted set in rendered messages: the path's last key,
    /// or the whole path when it has none.
    pub(crate) fn subject_label(&self) -> String {
        self.path
            .last_key()
            .map_or_else(|| self.path.to_string(), str::to_owned)
    }
}
