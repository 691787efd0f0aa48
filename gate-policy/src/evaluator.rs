//! Evaluation of a single rule against a launch context.

use gate_context::{LaunchContext, ResolvedValue, resolve};
use serde_json::Value;
use tracing::debug;

use crate::decision::Violation;
use crate::rule::{Predicate, Rule};
use crate::template::MessageVars;

/// Evaluates one rule, returning a violation when it fails.
///
/// Pure: the same rule and context always give the same answer. A path that
/// resolves to nothing never fails a rule, since nothing was supplied to check.
#[must_use]
pub fn evaluate(rule: &Rule, context: &LaunchContext) -> Option<Violation> {
    let resolved = resolve(context, rule.path());
    let violating = match rule.predicate() {
        Predicate::ValueAllowList {
            allowed_values,
            report,
        } => first_occurrences(
            resolved
                .iter()
                .filter(|candidate| {
                    !allowed_values
                        .iter()
                        .any(|allowed| allowed.matches(candidate.value()))
                })
                .map(|candidate| report.identify(candidate)),
        ),
        Predicate::FieldMustNotBeNull { identified_by } => first_occurrences(
            resolved
                .iter()
                .filter(|candidate| candidate.value().is_null())
                .map(|candidate| sibling_identifier(candidate, identified_by)),
        ),
    };

    if violating.is_empty() {
        return None;
    }

    debug!(
        rule = %rule.id(),
        kind = %rule.kind(),
        path = %rule.path(),
        violating = violating.len(),
        "governance rule violated"
    );

    let label = rule.subject_label();
    let allowed = match rule.predicate() {
        Predicate::ValueAllowList { allowed_values, .. } => {
            Some((label.as_str(), allowed_values.as_slice()))
        }
        Predicate::FieldMustNotBeNull { .. } => None,
    };
    let message = rule.message().render(&MessageVars {
        rule: rule.id(),
        path: rule.path(),
        violating: &violating,
        allowed,
    });

    Some(Violation::new(rule.id().clone(), message))
}

/// Names an offending element by a sibling field, falling back to the
/// element's location when the sibling is absent.
fn sibling_identifier(candidate: &ResolvedValue<'_>, key: &str) -> Value {
    candidate.sibling(key).cloned().unwrap_or_else(|| {
        let element = candidate.location().parent();
        Value::String(element.to_string())
    })
}

fn first_occurrences(values: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut unique = Vec::new();
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::ReportAs;
    use crate::template::MessageTemplate;
    use gate_primitives::RuleId;
    use serde_json::json;

    fn rule(path: &str, predicate: Predicate, message: &str) -> Rule {
        Rule::new(
            RuleId::new("rule-under-test").unwrap(),
            path.parse().unwrap(),
            predicate,
            MessageTemplate::parse(message).unwrap(),
        )
    }

    fn context(value: Value) -> LaunchContext {
        LaunchContext::try_from(value).unwrap()
    }

    #[test]
    fn allow_list_passes_members() {
        let rule = rule(
            "extra_vars.env",
            Predicate::value_allow_list(["dev", "staging"]),
            "bad: {violating}",
        );
        let ctx = context(json!({"extra_vars": {"env": "staging"}}));
        assert_eq!(evaluate(&rule, &ctx), None);
    }

    #[test]
    fn allow_list_reports_values_by_default() {
        let rule = rule(
            "extra_vars.env",
            Predicate::value_allow_list(["dev"]),
            "bad: {violating}; allowed {allowed}",
        );
        let ctx = context(json!({"extra_vars": {"env": "prod"}}));
        let violation = evaluate(&rule, &ctx).expect("violation");
        assert_eq!(violation.rule_id().as_str(), "rule-under-test");
        assert_eq!(violation.message(), r#"bad: prod; allowed {"env": ["dev"]}"#);
    }

    #[test]
    fn allow_list_can_report_keys() {
        let rule = rule(
            "extra_vars.env",
            Predicate::value_allow_list(["dev"]).reporting(ReportAs::Key),
            "keys: {violating_json}",
        );
        let ctx = context(json!({"extra_vars": {"env": "prod"}}));
        assert_eq!(evaluate(&rule, &ctx).unwrap().message(), r#"keys: ["env"]"#);
    }

    #[test]
    fn allow_list_ignores_absent_fields() {
        let rule = rule(
            "extra_vars.env",
            Predicate::value_allow_list(["dev"]),
            "{violating}",
        );
        assert_eq!(evaluate(&rule, &context(json!({}))), None);
        assert_eq!(evaluate(&rule, &context(json!({"extra_vars": {}}))), None);
        assert_eq!(
            evaluate(&rule, &context(json!({"extra_vars": "not a map"}))),
            None
        );
    }

    #[test]
    fn allow_list_is_exact_and_case_sensitive() {
        let exact = rule(
            "extra_vars.v",
            Predicate::value_allow_list(["Prod"]),
            "{violating_json}",
        );
        for value in [json!("prod"), json!("Prod "), json!(null), json!(["Prod"])] {
            let ctx = context(json!({"extra_vars": {"v": value}}));
            assert!(evaluate(&exact, &ctx).is_some(), "{value} should be rejected");
        }

        let numeric = rule(
            "extra_vars.v",
            Predicate::value_allow_list([1_i64]),
            "{violating_json}",
        );
        let ctx = context(json!({"extra_vars": {"v": "1"}}));
        assert_eq!(evaluate(&numeric, &ctx).unwrap().message(), r#"["1"]"#);
        let ctx = context(json!({"extra_vars": {"v": 1}}));
        assert_eq!(evaluate(&numeric, &ctx), None);
    }

    #[test]
    fn allow_list_over_wildcard_deduplicates() {
        let rule = rule(
            "credentials[*].kind",
            Predicate::value_allow_list(["ssh"]),
            "kinds: {violating_json}",
        );
        let ctx = context(json!({"credentials": [
            {"kind": "vault"}, {"kind": "ssh"}, {"kind": "aws"}, {"kind": "vault"}
        ]}));
        assert_eq!(
            evaluate(&rule, &ctx).unwrap().message(),
            r#"kinds: ["vault", "aws"]"#
        );
    }

    #[test]
    fn null_check_reports_sibling_names() {
        let rule = rule(
            "credentials[*].organization",
            Predicate::field_must_not_be_null(),
            "orphans: [{violating}]",
        );
        let ctx = context(json!({"credentials": [
            {"name": "Demo Credential", "organization": null},
            {"name": "Scoped", "organization": "Org1"},
            {"name": "Demo Credential", "organization": null},
            {"name": "Other", "organization": null}
        ]}));
        assert_eq!(
            evaluate(&rule, &ctx).unwrap().message(),
            "orphans: [Demo Credential, Other]"
        );
    }

    #[test]
    fn null_check_skips_missing_fields() {
        let rule = rule(
            "credentials[*].organization",
            Predicate::field_must_not_be_null(),
            "{violating}",
        );
        let ctx = context(json!({"credentials": [{"name": "no-org-key"}]}));
        assert_eq!(evaluate(&rule, &ctx), None);
        assert_eq!(evaluate(&rule, &context(json!({}))), None);
    }

    #[test]
    fn null_check_falls_back_to_location() {
        let rule = rule(
            "credentials[*].organization",
            Predicate::field_must_not_be_null().identified_by("id"),
            "{violating}",
        );
        let ctx = context(json!({"credentials": [
            {"id": 7, "organization": null},
            {"organization": null}
        ]}));
        assert_eq!(evaluate(&rule, &ctx).unwrap().message(), "7, credentials[1]");
    }

    #[test]
    fn evaluation_is_repeatable() {
        let rule = rule(
            "credentials[*].organization",
            Predicate::field_must_not_be_null(),
            "{rule} at {path}: {violating}",
        );
        let ctx = context(json!({"credentials": [{"name": "a", "organization": null}]}));
        let first = evaluate(&rule, &ctx);
        assert_eq!(first, evaluate(&rule, &ctx));
        assert_eq!(
            first.unwrap().message(),
            "rule-under-test at credentials[*].organization: a"
        );
    }
}
