use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{Value, json};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn run(context: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_launch-check"))
        .arg("--config")
        .arg(fixture("gate.json"))
        .arg("--context")
        .arg(fixture(context))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn denied_launch_prints_only_the_decision_on_stdout() {
    let output = run("denied.json");
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let decision: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        decision,
        json!({
            "allowed": false,
            "violations": [
                "extra_vars contain disallowed values for keys: [\"extra_var_key\"]. Allowed values: {\"extra_var_key\": [\"allowed_value1\", \"allowed_value2\"]}",
                "Credential used in job execution does not belong to any org. Violating credentials: [Demo Credential]"
            ]
        })
    );

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("launch denied"), "stderr: {stderr}");
}

#[test]
fn allowed_launch_exits_cleanly() {
    let output = run("allowed.json");
    assert!(output.status.success());

    let decision: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision, json!({"allowed": true, "violations": []}));
}
