//! Decision aggregation and the engines that serve it to callers.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use gate_context::LaunchContext;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info_span};

use crate::contracts::LaunchRequest;
use crate::decision::{Decision, Evaluation, Violation};
use crate::evaluator::evaluate;
use crate::ruleset::RuleSet;

/// Errors surfaced by decision engines.
///
/// Rule evaluation itself never fails; these cover the machinery around it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A worker task evaluating a rule did not complete.
    #[error("rule evaluation worker failed: {reason}")]
    Worker {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Runs every rule in order and records each failure.
///
/// No short-circuiting: the evaluation lists every failing rule.
#[must_use]
pub fn evaluate_all(rule_set: &RuleSet, context: &LaunchContext) -> Evaluation {
    let mut evaluation = Evaluation::new();
    for rule in rule_set {
        if let Some(violation) = evaluate(rule, context) {
            evaluation.push(violation);
        }
    }
    evaluation
}

/// Decides whether a launch complies with `rule_set`.
///
/// Starts from [`Decision::allow`] and appends one message per failing rule in
/// declaration order; the result is denied iff any message was appended.
#[must_use]
pub fn decide(rule_set: &RuleSet, context: &LaunchContext) -> Decision {
    let decision = evaluate_all(rule_set, context).into_decision();
    debug!(
        rules = rule_set.len(),
        allowed = decision.is_allowed(),
        violations = decision.violations().len(),
        "launch decision computed"
    );
    decision
}

/// Trait implemented by decision engines.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Decides the supplied launch request.
    async fn decide(&self, request: &LaunchRequest) -> EngineResult<Decision>;
}

/// Shared, swappable handle to the active rule set.
#[derive(Debug)]
struct ActiveRules(RwLock<Arc<RuleSet>>);

impl ActiveRules {
    fn new(rule_set: RuleSet) -> Self {
        Self(RwLock::new(Arc::new(rule_set)))
    }

    fn snapshot(&self) -> Arc<RuleSet> {
        let guard = self.0.read().expect("active rule set poisoned");
        Arc::clone(&guard)
    }

    fn install(&self, rule_set: RuleSet) -> Arc<RuleSet> {
        let mut guard = self.0.write().expect("active rule set poisoned");
        std::mem::replace(&mut *guard, Arc::new(rule_set))
    }
}

/// Engine evaluating rules one after another on the calling task.
#[derive(Debug)]
pub struct RuleSetEngine {
    rules: ActiveRules,
}

impl RuleSetEngine {
    /// Constructs an engine serving the supplied rule set.
    #[must_use]
    pub fn new(rule_set: RuleSet) -> Self {
        Self {
            rules: ActiveRules::new(rule_set),
        }
    }

    /// Replaces the active rule set, returning the previous one.
    ///
    /// Decisions already in flight finish against the set they started with.
    ///
    /// # Panics
    ///
    /// Panics if the internal rule store lock has been poisoned.
    pub fn install(&self, rule_set: RuleSet) -> Arc<RuleSet> {
        self.rules.install(rule_set)
    }

    /// Returns the active rule set.
    ///
    /// # Panics
    ///
    /// Panics if the internal rule store lock has been poisoned.
    #[must_use]
    pub fn rule_set(&self) -> Arc<RuleSet> {
        self.rules.snapshot()
    }
}

#[async_trait]
impl DecisionEngine for RuleSetEngine {
    async fn decide(&self, request: &LaunchRequest) -> EngineResult<Decision> {
        let rule_set = self.rules.snapshot();
        let span = info_span!(
            "launch_decision",
            request_id = %request.id(),
            template = request.template().unwrap_or("-"),
        );
        Ok(span.in_scope(|| decide(&rule_set, request.context())))
    }
}

/// Engine evaluating the rules of one decision concurrently on tokio tasks.
///
/// At most `max_concurrency` rules run at once. Violations are reassembled by
/// rule index, so the decision is identical to the sequential engine's.
#[derive(Debug)]
pub struct ParallelRuleSetEngine {
    rules: ActiveRules,
    semaphore: Arc<Semaphore>,
    max_concurrency: NonZeroUsize,
}

impl ParallelRuleSetEngine {
    /// Constructs an engine with the supplied concurrency limit.
    #[must_use]
    pub fn new(rule_set: RuleSet, max_concurrency: NonZeroUsize) -> Self {
        Self {
            rules: ActiveRules::new(rule_set),
            semaphore: Arc::new(Semaphore::new(max_concurrency.get())),
            max_concurrency,
        }
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub const fn max_concurrency(&self) -> NonZeroUsize {
        self.max_concurrency
    }

    /// Replaces the active rule set, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if the internal rule store lock has been poisoned.
    pub fn install(&self, rule_set: RuleSet) -> Arc<RuleSet> {
        self.rules.install(rule_set)
    }

    /// Returns the active rule set.
    ///
    /// # Panics
    ///
    /// Panics if the internal rule store lock has been poisoned.
    #[must_use]
    pub fn rule_set(&self) -> Arc<RuleSet> {
        self.rules.snapshot()
    }

    async fn evaluate_concurrently(
        &self,
        rule_set: Arc<RuleSet>,
        context: Arc<LaunchContext>,
    ) -> EngineResult<Evaluation> {
        let mut pending = FuturesUnordered::new();
        for index in 0..rule_set.len() {
            let rule_set = Arc::clone(&rule_set);
            let context = Arc::clone(&context);
            let semaphore = Arc::clone(&self.semaphore);
            pending.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|err| EngineError::Worker {
                        reason: err.to_string(),
                    })?;
                let violation = evaluate(&rule_set.rules()[index], &context);
                Ok::<_, EngineError>((index, violation))
            }));
        }

        let mut by_index: BTreeMap<usize, Violation> = BTreeMap::new();
        while let Some(joined) = pending.next().await {
            let (index, violation) = joined.map_err(|err| EngineError::Worker {
                reason: err.to_string(),
            })??;
            if let Some(violation) = violation {
                by_index.insert(index, violation);
            }
        }

        Ok(by_index.into_values().collect())
    }
}

#[async_trait]
impl DecisionEngine for ParallelRuleSetEngine {
    async fn decide(&self, request: &LaunchRequest) -> EngineResult<Decision> {
        let rule_set = self.rules.snapshot();
        let span = info_span!(
            "launch_decision",
            request_id = %request.id(),
            template = request.template().unwrap_or("-"),
            max_concurrency = self.max_concurrency.get(),
        );
        let context = Arc::new(request.context().clone());
        let rules = rule_set.len();
        let decision = self
            .evaluate_concurrently(rule_set, context)
            .instrument(span)
            .await?
            .into_decision();

        debug!(
            rules,
            allowed = decision.is_allowed(),
            violations = decision.violations().len(),
            "launch decision computed"
        );
        Ok(decision)
    }
}
