//! Ordered, immutable collections of rules.

use std::collections::BTreeSet;
use std::slice;

use crate::compiler::{CompileError, CompileResult};
use crate::rule::Rule;

/// Ordered sequence of rules evaluated in declaration order.
///
/// Read-only once built, so one set can back any number of concurrent
/// evaluations. Rule ids are unique within a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set, keeping the supplied order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateRuleId`] when two rules share an id.
    pub fn new(rules: Vec<Rule>) -> CompileResult<Self> {
        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.id()) {
                return Err(CompileError::DuplicateRuleId {
                    rule: rule.id().to_string(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Returns an empty rule set, which allows every launch.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks a rule up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id().as_str() == id)
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the rules in declaration order.
    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Returns a new set with `other`'s rules appended after this set's rules.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateRuleId`] when the sets share a rule id.
    pub fn concat(&self, other: &RuleSet) -> CompileResult<Self> {
        let mut rules = self.rules.clone();
        rules.extend(other.rules.iter().cloned());
        Self::new(rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Predicate;
    use crate::template::MessageTemplate;
    use gate_primitives::RuleId;

    fn rule(id: &str) -> Rule {
        Rule::new(
            RuleId::new(id).unwrap(),
            "extra_vars.k".parse().unwrap(),
            Predicate::value_allow_list(["v"]),
            MessageTemplate::parse("bad {violating}").unwrap(),
        )
    }

    #[test]
    fn keeps_declaration_order() {
        let set = RuleSet::new(vec![rule("b"), rule("a"), rule("c")]).unwrap();
        let ids: Vec<_> = set.iter().map(|rule| rule.id().as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(set.len(), 3);
        assert!(set.get("a").is_some());
        assert!(set.get("z").is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = RuleSet::new(vec![rule("a"), rule("b"), rule("a")]).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateRuleId { rule } if rule == "a"));
    }

    #[test]
    fn concat_appends_and_checks_ids() {
        let first = RuleSet::new(vec![rule("a")]).unwrap();
        let second = RuleSet::new(vec![rule("b")]).unwrap();
        let joined = first.concat(&second).unwrap();
        assert_eq!(joined.rules()[1].id().as_str(), "b");

        assert!(joined.concat(&second).is_err());
        assert!(RuleSet::empty().is_empty());
    }
}
