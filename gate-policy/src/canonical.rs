//! Ready-made rules for the two standard launch checks.
//!
//! * launch variables restricted to an allow-list, one rule per variable;
//! * credentials that must belong to an organization.

use gate_context::FieldPath;
use gate_primitives::{RuleId, Scalar};

use crate::compiler::{CompileError, CompileResult};
use crate::rule::{Predicate, ReportAs, Rule};
use crate::template::MessageTemplate;

/// Message for disallowed launch variables.
pub const EXTRA_VARS_MESSAGE: &str =
    "extra_vars contain disallowed values for keys: {violating_json}. Allowed values: {allowed}";

/// Message for credentials without an organization.
pub const CREDENTIAL_ORGANIZATION_MESSAGE: &str =
    "Credential used in job execution does not belong to any org. Violating credentials: [{violating}]";

/// Id of the credential organization rule.
pub const CREDENTIAL_ORGANIZATION_RULE: &str = "credentials.organization_required";

const EXTRA_VARS_RULE_PREFIX: &str = "extra_vars.allowed_values.";

/// Returns the id given to the allow-list rule for `key`.
///
/// Whitespace and control characters in the key are replaced by `_`.
#[must_use]
pub fn extra_var_rule_id(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect();
    format!("{EXTRA_VARS_RULE_PREFIX}{sanitized}")
}

/// Restricts `extra_vars.<key>` to the supplied values.
///
/// A launch that does not set the variable passes. A failing launch reports the
/// variable name, e.g. `extra_vars contain disallowed values for keys:
/// ["extra_var_key"]. Allowed values: {"extra_var_key": ["allowed_value1",
/// "allowed_value2"]}`.
///
/// # Errors
///
/// Returns [`CompileError::MalformedPath`] for an empty key and
/// [`CompileError::InvalidRuleId`] when the key is too long to form an id.
pub fn extra_var_allow_list<I, S>(key: &str, allowed: I) -> CompileResult<Rule>
where
    I: IntoIterator<Item = S>,
    S: Into<Scalar>,
{
    let id_text = extra_var_rule_id(key);
    let id = RuleId::new(id_text.clone()).map_err(|source| CompileError::InvalidRuleId {
        rule: id_text.clone(),
        source,
    })?;
    let path = FieldPath::from_keys(["extra_vars", key])
        .map_err(|source| CompileError::MalformedPath { rule: id_text, source })?;

    Ok(Rule::new(
        id,
        path,
        Predicate::value_allow_list(allowed).reporting(ReportAs::Key),
        canonical_template(EXTRA_VARS_MESSAGE),
    ))
}

/// Requires every credential's `organization` to be non-null, reporting
/// offending credentials by `name`.
///
/// # Panics
///
/// Never in practice: the path, id, and message are fixed and valid.
#[must_use]
pub fn credential_organization_required() -> Rule {
    let path = FieldPath::from_keys(["credentials"])
        .map(|path| path.each().child("organization"))
        .expect("static credential path is valid");
    Rule::new(
        RuleId::new(CREDENTIAL_ORGANIZATION_RULE).expect("static rule id is valid"),
        path,
        Predicate::field_must_not_be_null(),
        canonical_template(CREDENTIAL_ORGANIZATION_MESSAGE),
    )
}

fn canonical_template(text: &'static str) -> MessageTemplate {
    MessageTemplate::parse(text).expect("canonical templates are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use gate_context::LaunchContext;
    use serde_json::json;

    #[test]
    fn extra_var_rule_shape() {
        let rule = extra_var_allow_list("extra_var_key", ["allowed_value1", "allowed_value2"])
            .unwrap();
        assert_eq!(rule.id().as_str(), "extra_vars.allowed_values.extra_var_key");
        assert_eq!(rule.path().to_string(), "extra_vars.extra_var_key");
        assert_eq!(rule.message().as_str(), EXTRA_VARS_MESSAGE);
    }

    #[test]
    fn extra_var_rule_handles_awkward_keys() {
        let rule = extra_var_allow_list("app version.major", ["1"]).unwrap();
        assert_eq!(rule.id().as_str(), "extra_vars.allowed_values.app_version.major");
        assert_eq!(rule.path().to_string(), r#"extra_vars["app version.major"]"#);

        let ctx = LaunchContext::builder()
            .extra_var("app version.major", "2")
            .build();
        let violation = evaluate(&rule, &ctx).unwrap();
        assert_eq!(
            violation.message(),
            r#"extra_vars contain disallowed values for keys: ["app version.major"]. Allowed values: {"app version.major": ["1"]}"#
        );

        assert!(matches!(
            extra_var_allow_list("", ["x"]),
            Err(CompileError::MalformedPath { .. })
        ));
    }

    #[test]
    fn credential_rule_shape() {
        let rule = credential_organization_required();
        assert_eq!(rule.path().to_string(), "credentials[*].organization");

        let ctx = LaunchContext::try_from(json!({
            "credentials": [{"name": "Demo Credential", "organization": null}]
        }))
        .unwrap();
        assert_eq!(
            evaluate(&rule, &ctx).unwrap().message(),
            "Credential used in job execution does not belong to any org. Violating credentials: [Demo Credential]"
        );
    }
}
