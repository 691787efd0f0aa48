//! Governance rule evaluation for job launches.
//!
//! A [`RuleSet`] of normalized [`Rule`]s is evaluated against a
//! [`LaunchContext`](gate_context::LaunchContext) to produce a [`Decision`]:
//! `allowed` plus every violation message, in rule-declaration order.
//!
//! ```
//! use gate_context::LaunchContext;
//! use gate_policy::{RuleSet, canonical, decide};
//!
//! let rules = RuleSet::new(vec![
//!     canonical::extra_var_allow_list("extra_var_key", ["allowed_value1", "allowed_value2"])
//!         .unwrap(),
//!     canonical::credential_organization_required(),
//! ])
//! .unwrap();
//!
//! let context = LaunchContext::builder()
//!     .extra_var("extra_var_key", "allowed_value1")
//!     .build();
//! assert!(decide(&rules, &context).is_allowed());
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod canonical;
pub mod compiler;
pub mod contracts;
pub mod decision;
pub mod engine;
pub mod evaluator;
pub mod rule;
pub mod ruleset;
pub mod template;

pub use compiler::{
    CompileError, CompileResult, DeclarationCompiler, RuleCompiler, RuleDeclaration,
    compile_declarations,
};
pub use contracts::LaunchRequest;
pub use decision::{Decision, DecisionError, Evaluation, Violation};
pub use engine::{
    DecisionEngine, EngineError, EngineResult, ParallelRuleSetEngine, RuleSetEngine, decide,
    evaluate_all,
};
pub use evaluator::evaluate;
pub use rule::{Predicate, PredicateKind, ReportAs, Rule};
pub use ruleset::RuleSet;
pub use template::{MessageTemplate, TemplateError};
