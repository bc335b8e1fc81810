//! Policy evaluation engine.

use crate::context::EvaluationInputs;
use crate::decision::PolicyDecision;
use crate::error::{PolicyError, Result};
use crate::operator;
use crate::policy::Policy;
use crate::types::{NodeId, NodeShape};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Evaluator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Run the validator before every walk. Off by default: snapshots are
    /// validated when they are published.
    pub revalidate: bool,

    /// Upper bound on nodes visited per walk. The node count is always a
    /// bound; this can only lower it.
    pub max_steps: Option<usize>,
}

impl EvaluatorConfig {
    /// Parses a config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PolicyError::ParseError(e.to_string()))
    }
}

/// Walks policies to a decision.
///
/// Holds only configuration, so one evaluator can serve any number of
/// threads and policies.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    config: EvaluatorConfig,
}

impl PolicyEvaluator {
    /// Creates a new evaluator with the default config.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluates the policy and returns the decision value.
    pub fn evaluate(&self, policy: &Policy, inputs: &EvaluationInputs) -> Result<f64> {
        self.walk(policy, inputs).map(|(value, _)| value)
    }

    /// Evaluates the policy and returns the decision with the path taken.
    pub fn evaluate_detailed(
        &self,
        policy: &Policy,
        inputs: &EvaluationInputs,
    ) -> Result<PolicyDecision> {
        #[cfg(not(target_arch = "wasm32"))]
        let start = std::time::Instant::now();

        let (value, path) = self.walk(policy, inputs)?;
        let decision = PolicyDecision::new(value, &policy.id, path);

        #[cfg(not(target_arch = "wasm32"))]
        let decision = decision.with_evaluation_time(start.elapsed().as_micros() as u64);

        Ok(decision)
    }

    fn walk(&self, policy: &Policy, inputs: &EvaluationInputs) -> Result<(f64, Vec<NodeId>)> {
        if self.config.revalidate {
            policy.validate()?;
        }

        let mut current = policy.start()?;
        let limit = self
            .config
            .max_steps
            .map_or(policy.len(), |max| max.min(policy.len()));
        let mut visited = vec![false; policy.len()];
        let mut path = Vec::new();

        loop {
            let Some(node) = policy.node(current) else {
                return Err(no_decision(
                    policy,
                    format!("condition {} does not exist", current),
                ));
            };
            if visited[current.index()] {
                return Err(no_decision(
                    policy,
                    format!("condition {} was reached twice", current),
                ));
            }
            if path.len() >= limit {
                warn!(policy_id = %policy.id, limit, "step limit reached before a decision");
                return Err(PolicyError::NoDecisionReached {
                    policy_id: policy.id.clone(),
                    reason: format!("step limit of {} reached", limit),
                });
            }
            visited[current.index()] = true;
            path.push(current);

            match node.shape(current)? {
                NodeShape::Decision(value) => {
                    debug!(
                        policy_id = %policy.id,
                        node = %current,
                        decision = value,
                        "reached decision"
                    );
                    return Ok((value, path));
                }
                NodeShape::Branch {
                    variable,
                    operator,
                    threshold,
                    when_true,
                    when_false,
                } => {
                    let input = inputs.number(variable)?;
                    let holds = operator::compare(operator, input, threshold)?;
                    let next = if holds { when_true } else { when_false };

                    debug!(
                        policy_id = %policy.id,
                        node = %current,
                        variable,
                        input,
                        operator,
                        threshold,
                        holds,
                        next = %next,
                        "evaluated condition"
                    );
                    current = next;
                }
            }
        }
    }
}

fn no_decision(policy: &Policy, reason: String) -> PolicyError {
    error!(policy_id = %policy.id, %reason, "walk ended without a decision");
    PolicyError::NoDecisionReached {
        policy_id: policy.id.clone(),
        reason,
    }
}

/// Evaluates a policy with the default evaluator.
pub fn evaluate(policy: &Policy, inputs: &EvaluationInputs) -> Result<f64> {
    PolicyEvaluator::new().evaluate(policy, inputs)
}
