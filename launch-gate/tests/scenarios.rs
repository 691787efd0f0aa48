use launch_gate::config::GateConfig;
use launch_gate::policy::canonical;
use launch_gate::{Decision, LaunchContext, LaunchRequest, RuleSet, decide};
use serde_json::{Value, json};

fn canonical_rules() -> RuleSet {
    RuleSet::new(vec![
        canonical::extra_var_allow_list("extra_var_key", ["allowed_value1", "allowed_value2"])
            .unwrap(),
        canonical::credential_organization_required(),
    ])
    .unwrap()
}

fn context(value: Value) -> LaunchContext {
    LaunchContext::try_from(value).unwrap()
}

fn decision_json(decision: &Decision) -> Value {
    serde_json::to_value(decision).unwrap()
}

#[test]
fn allowed_extra_var_passes() {
    let decision = decide(
        &canonical_rules(),
        &context(json!({"extra_vars": {"extra_var_key": "allowed_value1"}})),
    );
    assert_eq!(
        decision_json(&decision),
        json!({"allowed": true, "violations": []})
    );
}

#[test]
fn disallowed_extra_var_is_reported_by_key() {
    let decision = decide(
        &canonical_rules(),
        &context(json!({"extra_vars": {"extra_var_key": "unauthorized_value"}})),
    );
    assert_eq!(
        decision_json(&decision),
        json!({
            "allowed": false,
            "violations": [
                "extra_vars contain disallowed values for keys: [\"extra_var_key\"]. Allowed values: {\"extra_var_key\": [\"allowed_value1\", \"allowed_value2\"]}"
            ]
        })
    );
}

#[test]
fn credential_without_organization_is_denied() {
    let decision = decide(
        &canonical_rules(),
        &context(json!({"credentials": [{"name": "Demo Credential", "organization": null}]})),
    );
    assert_eq!(
        decision_json(&decision),
        json!({
            "allowed": false,
            "violations": [
                "Credential used in job execution does not belong to any org. Violating credentials: [Demo Credential]"
            ]
        })
    );
}

#[test]
fn credential_with_organization_passes() {
    let decision = decide(
        &canonical_rules(),
        &context(json!({"credentials": [{"name": "Demo Credential", "organization": "Org1"}]})),
    );
    assert_eq!(
        decision_json(&decision),
        json!({"allowed": true, "violations": []})
    );
}

#[test]
fn both_failures_are_reported_in_rule_order() {
    let decision = decide(
        &canonical_rules(),
        &context(json!({
            "credentials": [{"name": "Demo Credential", "organization": null}],
            "extra_vars": {"extra_var_key": "unauthorized_value"}
        })),
    );
    assert!(decision.is_denied());
    assert_eq!(decision.violations().len(), 2);
    assert!(decision.violations()[0].starts_with("extra_vars contain disallowed values"));
    assert!(decision.violations()[1].starts_with("Credential used in job execution"));
}

#[tokio::test]
async fn configured_engine_reproduces_scenarios() {
    let config = GateConfig::from_json_str(
        r#"{
            "extra_vars": {"allowed_values": {"extra_var_key": ["allowed_value1", "allowed_value2"]}},
            "credentials": {"require_organization": true}
        }"#,
    )
    .unwrap();
    let engine = config.build_engine().unwrap();

    let cases = [
        (json!({"extra_vars": {"extra_var_key": "allowed_value1"}}), true),
        (json!({"extra_vars": {"extra_var_key": "unauthorized_value"}}), false),
        (
            json!({"credentials": [{"name": "Demo Credential", "organization": null}]}),
            false,
        ),
        (
            json!({"credentials": [{"name": "Demo Credential", "organization": "Org1"}]}),
            true,
        ),
    ];

    for (payload, allowed) in cases {
        let request = LaunchRequest::new(context(payload.clone()));
        let decision = engine.decide(&request).await.unwrap();
        assert_eq!(decision.is_allowed(), allowed, "payload {payload}");
        assert_eq!(decision, decide(&canonical_rules(), request.context()));
    }
}
