//! Decision types returned by the aggregator.

use gate_primitives::RuleId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when decoding a decision produced elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// `allowed` disagrees with the presence of violations.
    #[error("inconsistent decision: allowed={allowed} with {violations} violation(s)")]
    Inconsistent {
        /// Claimed `allowed` flag.
        allowed: bool,
        /// Number of violations carried.
        violations: usize,
    },
}

/// A single rule failure with its rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    rule_id: RuleId,
    message: String,
}

impl Violation {
    /// Creates a violation for the given rule.
    #[must_use]
    pub fn new(rule_id: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            message: message.into(),
        }
    }

    /// Returns the id of the failing rule.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        &self.rule_id
    }

    /// Returns the rendered message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every violation found for one context, in rule-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    violations: Vec<Violation>,
}

impl Evaluation {
    /// Starts an evaluation with no violations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation after those already recorded.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Returns the recorded violations.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns `true` when no rule failed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Collapses the evaluation into the caller-facing decision.
    #[must_use]
    pub fn into_decision(self) -> Decision {
        let mut decision = Decision::allow();
        for violation in self.violations {
            decision.violations.push(violation.message);
        }
        decision.allowed = decision.violations.is_empty();
        decision
    }
}

impl FromIterator<Violation> for Evaluation {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

/// Final allow/deny outcome for one launch.
///
/// `allowed` is always equal to `violations.is_empty()`: the fields are private,
/// decisions are only built from violations, and deserialization rejects
/// payloads that break the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DecisionRepr")]
pub struct Decision {
    allowed: bool,
    violations: Vec<String>,
}

impl Decision {
    /// Returns the initial decision: allowed, with no violations.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            violations: Vec::new(),
        }
    }

    /// Builds a decision from violation messages; denied iff any are given.
    #[must_use]
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let violations: Vec<String> = messages.into_iter().map(Into::into).collect();
        Self {
            allowed: violations.is_empty(),
            violations,
        }
    }

    /// Returns true when the launch may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Returns true when the launch must be blocked.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    /// Returns violation messages in rule-declaration order.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Consumes the decision, returning its violation messages.
    #[must_use]
    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::allow()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DecisionRepr {
    allowed: bool,
    #[serde(default)]
    violations: Vec<String>,
}

impl TryFrom<DecisionRepr> for Decision {
    type Error = DecisionError;

    fn try_from(repr: DecisionRepr) -> Result<Self, Self::Error> {
        if repr.allowed != repr.violations.is_empty() {
            return Err(DecisionError::Inconsistent {
                allowed: repr.allowed,
                violations: repr.violations.len(),
            });
        }
        Ok(Self {
            allowed: repr.allowed,
            violations: repr.violations,
        })
    }
}
