//! Policy definition and management.

use crate::error::{PolicyError, Result};
use crate::types::{ConditionNode, NodeId, PolicySummary};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A decision tree over named numeric inputs.
///
/// Nodes live in `conditions`; a node's [`NodeId`] is its position in that
/// list, and branches refer to other nodes by that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique identifier for the policy.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Description of what this policy does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Node where evaluation starts.
    #[serde(default)]
    pub start_condition: Option<NodeId>,

    /// The node arena.
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,

    /// Policy metadata.
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub metadata: std::collections::HashMap<String, serde_json::Value>,
}

impl Policy {
    /// Creates an empty policy with no start condition.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            start_condition: None,
            conditions: Vec::new(),
            metadata: std::collections::HashMap::new(),
        }
    }

    /// Parses a policy from YAML and validates it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let policy: Policy = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parses a policy from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Policy =
            serde_json::from_str(json).map_err(|e| PolicyError::ParseError(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Serializes the policy to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Serializes the policy to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Checks the id and name, then runs the structural checks.
    ///
    /// See [`crate::validator::validate`] for the tree checks.
    pub fn validate(&self) -> Result<()> {
        self.check_identity()?;
        crate::validator::validate(self)
    }

    fn check_identity(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PolicyError::BlankIdentity { field: "id" });
        }
        if self.name.trim().is_empty() {
            return Err(PolicyError::BlankIdentity { field: "name" });
        }
        Ok(())
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&ConditionNode> {
        self.conditions.get(id.index())
    }

    /// Returns the start node id, provided it resolves.
    pub fn start(&self) -> Result<NodeId> {
        self.start_condition
            .filter(|id| self.node(*id).is_some())
            .ok_or_else(|| PolicyError::MissingStartCondition {
                policy_id: self.id.clone(),
            })
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Ids of all nodes reachable from the start node, in breadth-first order.
    ///
    /// References that do not resolve are skipped. Empty when the start node
    /// does not resolve.
    pub fn reachable_nodes(&self) -> Vec<NodeId> {
        let Ok(start) = self.start() else {
            return Vec::new();
        };

        let mut seen = vec![false; self.conditions.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start.index()] = true;

        while let Some(id) = queue.pop_front() {
            order.push(id);
            let Some(node) = self.node(id) else {
                continue;
            };
            for (_, child) in node.children() {
                if let Some(flag) = seen.get_mut(child.index()) {
                    if !*flag {
                        *flag = true;
                        queue.push_back(child);
                    }
                }
            }
        }

        order
    }

    /// Ids of nodes that no path from the start node can reach.
    pub fn unreachable_nodes(&self) -> Vec<NodeId> {
        let mut reachable = vec![false; self.conditions.len()];
        for id in self.reachable_nodes() {
            reachable[id.index()] = true;
        }
        reachable
            .iter()
            .enumerate()
            .filter(|(_, r)| !**r)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Builder for assembling a policy node by node.
///
/// Ids are handed out in insertion order, so a branch may refer to a node
/// that is added later via [`PolicyBuilder::next_id`] arithmetic.
#[derive(Debug)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    /// Creates a new policy builder.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            policy: Policy::new(id, name),
        }
    }

    /// Sets the description.
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.policy.description = Some(description.into());
        self
    }

    /// Id the next added node will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.policy.conditions.len())
    }

    /// Adds a node and returns its id.
    pub fn add(&mut self, node: ConditionNode) -> NodeId {
        let id = self.next_id();
        self.policy.conditions.push(node);
        id
    }

    /// Adds a terminal node.
    pub fn add_decision(&mut self, value: f64) -> NodeId {
        self.add(ConditionNode::decision(value))
    }

    /// Adds a branching node.
    pub fn add_branch(
        &mut self,
        variable: impl Into<String>,
        operator: impl Into<String>,
        threshold: f64,
        when_true: NodeId,
        when_false: NodeId,
    ) -> NodeId {
        self.add(ConditionNode::branch(
            variable, operator, threshold, when_true, when_false,
        ))
    }

    /// Sets the start node.
    pub fn start(&mut self, id: NodeId) -> &mut Self {
        self.policy.start_condition = Some(id);
        self
    }

    /// Builds the policy without checking it.
    pub fn build(self) -> Policy {
        self.policy
    }

    /// Builds the policy and runs the validator on it.
    pub fn build_validated(self) -> Result<Policy> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;

    #[test]
    fn test_policy_from_yaml() {
        let yaml = r#"
id: credit-limit
name: Credit Limit
description: Grants a limit to adults
start_condition: 0
conditions:
  - variable: age
    operator: ">"
    threshold: 18
    when_true: 1
    when_false: 2
  - decision: 1000
  - decision: 0
"#;

        let policy = Policy::from_yaml(yaml).unwrap();
        assert_eq!(policy.id, "credit-limit");
        assert_eq!(policy.len(), 3);
        assert_eq!(policy.start().unwrap(), NodeId(0));
        assert!(policy.unreachable_nodes().is_empty());
    }

    #[test]
    fn test_from_yaml_rejects_invalid_tree() {
        let yaml = r#"
id: broken
name: Broken
start_condition: 4
conditions:
  - decision: 1
"#;
        assert!(matches!(
            Policy::from_yaml(yaml),
            Err(PolicyError::MissingStartCondition { .. })
        ));
    }

    #[test]
    fn test_blank_name_or_id_is_rejected() {
        let yaml = r#"
id: p
name: ""
start_condition: 0
conditions:
  - decision: 1
"#;
        let err = Policy::from_yaml(yaml).unwrap_err();
        assert_eq!(err, PolicyError::BlankIdentity { field: "name" });
        assert_eq!(err.status_code(), 400);

        let json = r#"{"id":"  ","name":"P","start_condition":0,"conditions":[{"decision":1}]}"#;
        assert_eq!(
            Policy::from_json(json),
            Err(PolicyError::BlankIdentity { field: "id" })
        );

        let mut builder = PolicyBuilder::new("p", " ");
        let d = builder.add_decision(1.0);
        builder.start(d);
        assert_eq!(
            builder.build_validated(),
            Err(PolicyError::BlankIdentity { field: "name" })
        );
    }

    #[test]
    fn test_from_json_syntax_error() {
        assert!(matches!(
            Policy::from_json("{ not json"),
            Err(PolicyError::ParseError(_))
        ));
    }

    #[test]
    fn test_builder() {
        let mut builder = PolicyBuilder::new("p", "P");
        builder.description("built in code");
        let yes = builder.add_decision(1.0);
        let no = builder.add_decision(0.0);
        let root = builder.add_branch("score", Operator::GreaterThanOrEqual, 50.0, yes, no);
        builder.start(root);

        let policy = builder.build_validated().unwrap();
        assert_eq!(root, NodeId(2));
        assert_eq!(policy.start_condition, Some(root));
        assert_eq!(policy.description.as_deref(), Some("built in code"));
        assert_eq!(policy.reachable_nodes(), vec![NodeId(2), NodeId(0), NodeId(1)]);
    }

    #[test]
    fn test_unreachable_nodes() {
        let mut builder = PolicyBuilder::new("p", "P");
        let start = builder.add_decision(1.0);
        builder.add_decision(2.0);
        builder.start(start);
        let policy = builder.build();

        assert_eq!(policy.unreachable_nodes(), vec![NodeId(1)]);
    }

    #[test]
    fn test_start_without_condition() {
        let policy = Policy::new("empty", "Empty");
        assert!(matches!(
            policy.start(),
            Err(PolicyError::MissingStartCondition { .. })
        ));
        assert!(policy.reachable_nodes().is_empty());
    }

    #[test]
    fn test_round_trip_yaml() {
        let mut builder = PolicyBuilder::new("p", "P");
        let d = builder.add_decision(7.5);
        builder.start(d);
        let policy = builder.build();

        let yaml = policy.to_yaml().unwrap();
        assert_eq!(Policy::from_yaml(&yaml).unwrap(), policy);
    }
}
