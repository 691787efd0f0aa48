//! Strongly typed configuration schema.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use gate_policy::{
    CompileResult, DecisionEngine, ParallelRuleSetEngine, RuleDeclaration, RuleSet, RuleSetEngine,
    canonical, compile_declarations,
};
use gate_primitives::Scalar;
use gate_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigResult;

const DEFAULT_MAX_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(8).unwrap();

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// How decisions are evaluated.
    pub engine: EngineSettings,
    /// Allow-lists for launch variables.
    pub extra_vars: ExtraVarsPolicy,
    /// Credential ownership checks.
    pub credentials: CredentialsPolicy,
    /// Authored rules, evaluated after the canonical ones.
    pub rules: Vec<RuleDeclaration>,
    /// Subscriber settings for the hosting process.
    pub telemetry: TelemetryConfig,
}

/// Evaluation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Rules evaluated one after another on the calling task.
    #[default]
    Sequential,
    /// Rules evaluated as concurrent tokio tasks.
    Parallel,
}

/// Engine section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Evaluation strategy.
    pub mode: EngineMode,
    /// Upper bound on concurrently evaluated rules in parallel mode.
    pub max_concurrency: NonZeroUsize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: EngineMode::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Launch variable section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtraVarsPolicy {
    /// Allowed values per variable name. Variables not listed are unrestricted.
    pub allowed_values: BTreeMap<String, Vec<Scalar>>,
}

/// Credential section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsPolicy {
    /// Deny launches using credentials that belong to no organization.
    pub require_organization: bool,
}

impl GateConfig {
    /// Builds the rules implied by the `extra_vars` and `credentials` sections.
    ///
    /// Variable rules come first in variable-name order, then the credential rule.
    ///
    /// # Errors
    ///
    /// Returns a [`gate_policy::CompileError`] for a variable name that cannot
    /// form a rule, or when two names sanitize to the same rule id.
    pub fn canonical_rules(&self) -> CompileResult<RuleSet> {
        let mut rules = Vec::with_capacity(self.extra_vars.allowed_values.len() + 1);
        for (key, allowed) in &self.extra_vars.allowed_values {
            rules.push(canonical::extra_var_allow_list(key, allowed.iter().cloned())?);
        }
        if self.credentials.require_organization {
            rules.push(canonical::credential_organization_required());
        }
        RuleSet::new(rules)
    }

    /// Compiles the complete rule set: canonical rules followed by `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Policy`] when any rule fails to compile;
    /// no partial set is produced.
    pub fn compile_rule_set(&self) -> ConfigResult<RuleSet> {
        let canonical = self.canonical_rules()?;
        let declared = compile_declarations(&self.rules)?;
        let rule_set = canonical.concat(&declared)?;
        debug!(
            canonical = canonical.len(),
            declared = declared.len(),
            "policy compiled"
        );
        Ok(rule_set)
    }

    /// Compiles the policy and wraps it in the configured engine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Policy`] when the policy does not compile.
    pub fn build_engine(&self) -> ConfigResult<Box<dyn DecisionEngine>> {
        let rule_set = self.compile_rule_set()?;
        let engine: Box<dyn DecisionEngine> = match self.engine.mode {
            EngineMode::Sequential => Box::new(RuleSetEngine::new(rule_set)),
            EngineMode::Parallel => Box::new(ParallelRuleSetEngine::new(
                rule_set,
                self.engine.max_concurrency,
            )),
        };
        Ok(engine)
    }
}
