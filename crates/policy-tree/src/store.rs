//! Published policy snapshots.
//!
//! Evaluators never see a policy being edited. Publishing validates a new
//! [`Policy`], wraps it in an immutable [`PolicySnapshot`] and swaps the
//! `Arc` stored under its id. Readers clone the `Arc` they find and keep
//! walking it even if a newer snapshot replaces it mid-evaluation.

use crate::context::EvaluationInputs;
use crate::decision::PolicyDecision;
use crate::error::{PolicyError, Result};
use crate::evaluator::PolicyEvaluator;
use crate::hash::policy_fingerprint;
use crate::policy::Policy;
use crate::types::PolicySummary;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// An immutable, validated policy as evaluators see it.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    policy: Policy,
    fingerprint: String,
    revision: u64,
    published_at: DateTime<Utc>,
}

impl PolicySnapshot {
    /// Validates the policy and freezes it as revision 1.
    pub fn new(policy: Policy) -> Result<Self> {
        policy.validate()?;
        let fingerprint = policy_fingerprint(&policy)?;
        Ok(Self {
            policy,
            fingerprint,
            revision: 1,
            published_at: Utc::now(),
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn id(&self) -> &str {
        &self.policy.id
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Publication count for this policy id, starting at 1.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    /// Evaluates this snapshot.
    pub fn evaluate(
        &self,
        evaluator: &PolicyEvaluator,
        inputs: &EvaluationInputs,
    ) -> Result<PolicyDecision> {
        Ok(evaluator
            .evaluate_detailed(&self.policy, inputs)?
            .with_fingerprint(&self.fingerprint))
    }
}

/// Interface for policy snapshot storage.
pub trait PolicyStore: Send + Sync {
    /// Validates and publishes a policy, replacing any snapshot with its id.
    fn publish(&self, policy: Policy) -> Result<Arc<PolicySnapshot>>;

    /// Current snapshot for a policy id.
    fn get(&self, policy_id: &str) -> Result<Arc<PolicySnapshot>>;

    /// Removes a policy. In-flight evaluations keep their snapshot.
    fn remove(&self, policy_id: &str) -> Result<Arc<PolicySnapshot>>;

    /// Id and name of every stored policy, ordered by id.
    fn list(&self) -> Vec<PolicySummary>;

    /// Number of stored policies.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory policy store.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    snapshots: RwLock<HashMap<String, Arc<PolicySnapshot>>>,
    evaluator: PolicyEvaluator,
}

impl MemoryPolicyStore {
    /// Creates an empty store with a default evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that evaluates with the given evaluator.
    pub fn with_evaluator(evaluator: PolicyEvaluator) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// Evaluates the current snapshot of a policy.
    pub fn evaluate(&self, policy_id: &str, inputs: &EvaluationInputs) -> Result<PolicyDecision> {
        let snapshot = self.get(policy_id)?;
        snapshot.evaluate(&self.evaluator, inputs)
    }

    /// Publishes every policy, stopping at the first rejected one.
    pub fn publish_all(&self, policies: impl IntoIterator<Item = Policy>) -> Result<usize> {
        let mut count = 0;
        for policy in policies {
            self.publish(policy)?;
            count += 1;
        }
        Ok(count)
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn publish(&self, policy: Policy) -> Result<Arc<PolicySnapshot>> {
        // Validation and hashing happen before the lock is taken.
        let mut snapshot = PolicySnapshot::new(policy)?;

        let mut snapshots = self.snapshots.write();
        if let Some(current) = snapshots.get(snapshot.id()) {
            if current.fingerprint == snapshot.fingerprint {
                debug!(
                    policy_id = %snapshot.id(),
                    revision = current.revision,
                    "policy unchanged, keeping current snapshot"
                );
                return Ok(Arc::clone(current));
            }
            snapshot.revision = current.revision + 1;
        }

        let snapshot = Arc::new(snapshot);
        snapshots.insert(snapshot.id().to_string(), Arc::clone(&snapshot));
        drop(snapshots);

        info!(
            policy_id = %snapshot.id(),
            revision = snapshot.revision,
            fingerprint = %snapshot.fingerprint,
            "published policy"
        );
        Ok(snapshot)
    }

    fn get(&self, policy_id: &str) -> Result<Arc<PolicySnapshot>> {
        self.snapshots
            .read()
            .get(policy_id)
            .cloned()
            .ok_or_else(|| PolicyError::NotFound(policy_id.to_string()))
    }

    fn remove(&self, policy_id: &str) -> Result<Arc<PolicySnapshot>> {
        let removed = self
            .snapshots
            .write()
            .remove(policy_id)
            .ok_or_else(|| PolicyError::NotFound(policy_id.to_string()))?;
        info!(policy_id = %policy_id, revision = removed.revision, "removed policy");
        Ok(removed)
    }

    fn list(&self) -> Vec<PolicySummary> {
        let mut summaries: Vec<PolicySummary> = self
            .snapshots
            .read()
            .values()
            .map(|s| s.policy.summary())
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    fn len(&self) -> usize {
        self.snapshots.read().len()
    }
}
