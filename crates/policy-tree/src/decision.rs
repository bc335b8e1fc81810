//! Policy decision types.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// A complete policy decision with metadata.
///
/// Serializes with the value under a top-level `decision` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// The decision value of the terminal node reached.
    pub decision: f64,

    /// ID of the policy that made the decision.
    pub policy_id: String,

    /// Terminal node the walk stopped at.
    pub decision_node: NodeId,

    /// Nodes visited, start node first, terminal node last.
    pub path: Vec<NodeId>,

    /// Fingerprint of the snapshot evaluated, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Time taken to evaluate (in microseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_time_us: Option<u64>,
}

impl PolicyDecision {
    /// Creates a decision from a completed walk.
    pub fn new(decision: f64, policy_id: impl Into<String>, path: Vec<NodeId>) -> Self {
        let decision_node = path.last().copied().unwrap_or_default();
        Self {
            decision,
            policy_id: policy_id.into(),
            decision_node,
            path,
            fingerprint: None,
            evaluation_time_us: None,
        }
    }

    /// Sets the snapshot fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Sets the evaluation time.
    pub fn with_evaluation_time(mut self, time_us: u64) -> Self {
        self.evaluation_time_us = Some(time_us);
        self
    }

    /// Number of comparisons made on the way to the decision.
    pub fn comparisons(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_payload() {
        let decision = PolicyDecision::new(1000.0, "age", vec![NodeId(0), NodeId(1)]);
        assert_eq!(decision.decision_node, NodeId(1));
        assert_eq!(decision.comparisons(), 1);

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], serde_json::json!(1000.0));
        assert!(json.get("fingerprint").is_none());
    }

    #[test]
    fn test_builders() {
        let decision = PolicyDecision::new(0.0, "age", vec![NodeId(2)])
            .with_fingerprint("p:abc")
            .with_evaluation_time(12);
        assert_eq!(decision.fingerprint.as_deref(), Some("p:abc"));
        assert_eq!(decision.evaluation_time_us, Some(12));
        assert_eq!(decision.comparisons(), 0);
    }
}
