//! Core types for the policy engine.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a condition node: its index in the owning policy's node list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which outgoing edge of a branching node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    True,
    False,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::True => "true",
            Branch::False => "false",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of a policy tree, as authored.
///
/// The stored shape is flat so that documents mixing branch and decision
/// fields still load; [`ConditionNode::shape`] is what decides whether the
/// node is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionNode {
    /// Name of the input variable compared by a branching node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// Comparison symbol, kept as authored and resolved at evaluation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Right-hand side of the comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Node to continue with when the comparison holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_true: Option<NodeId>,

    /// Node to continue with when the comparison does not hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_false: Option<NodeId>,

    /// Value returned when evaluation stops at this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<f64>,
}

/// Checked view of a [`ConditionNode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeShape<'a> {
    Branch {
        variable: &'a str,
        operator: &'a str,
        threshold: f64,
        when_true: NodeId,
        when_false: NodeId,
    },
    Decision(f64),
}

impl ConditionNode {
    /// Creates a branching node.
    pub fn branch(
        variable: impl Into<String>,
        operator: impl Into<String>,
        threshold: f64,
        when_true: NodeId,
        when_false: NodeId,
    ) -> Self {
        Self {
            variable: Some(variable.into()),
            operator: Some(operator.into()),
            threshold: Some(threshold),
            when_true: Some(when_true),
            when_false: Some(when_false),
            decision: None,
        }
    }

    /// Creates a terminal node.
    pub fn decision(value: f64) -> Self {
        Self {
            decision: Some(value),
            ..Self::default()
        }
    }

    fn has_branch_fields(&self) -> bool {
        self.variable.is_some()
            || self.operator.is_some()
            || self.threshold.is_some()
            || self.when_true.is_some()
            || self.when_false.is_some()
    }

    /// Outgoing references that are present, tagged with their edge.
    pub fn children(&self) -> impl Iterator<Item = (Branch, NodeId)> {
        [
            self.when_true.map(|id| (Branch::True, id)),
            self.when_false.map(|id| (Branch::False, id)),
        ]
        .into_iter()
        .flatten()
    }

    /// Classifies the node as branching or terminal.
    ///
    /// `id` only labels the error.
    pub fn shape(&self, id: NodeId) -> Result<NodeShape<'_>> {
        let malformed = |reason: &str| PolicyError::MalformedNode {
            node: id,
            reason: reason.to_string(),
        };

        match (self.decision, self.has_branch_fields()) {
            (Some(_), true) => Err(malformed("has both a decision value and branch fields")),
            (None, false) => Err(malformed("has neither a decision value nor branch fields")),
            (Some(value), false) => {
                if !value.is_finite() {
                    return Err(malformed("decision value is not finite"));
                }
                Ok(NodeShape::Decision(value))
            }
            (None, true) => {
                let variable = self
                    .variable
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| malformed("input variable is missing or empty"))?;
                let operator = self
                    .operator
                    .as_deref()
                    .ok_or_else(|| malformed("operator is missing"))?;
                let threshold = self
                    .threshold
                    .ok_or_else(|| malformed("threshold is missing"))?;
                if !threshold.is_finite() {
                    return Err(malformed("threshold is not finite"));
                }
                let when_true = self
                    .when_true
                    .ok_or_else(|| malformed("true branch is missing"))?;
                let when_false = self
                    .when_false
                    .ok_or_else(|| malformed("false branch is missing"))?;

                Ok(NodeShape::Branch {
                    variable,
                    operator,
                    threshold,
                    when_true,
                    when_false,
                })
            }
        }
    }

    /// Returns true if the node is a well-formed terminal node.
    pub fn is_decision(&self) -> bool {
        matches!(self.shape(NodeId(0)), Ok(NodeShape::Decision(_)))
    }
}

/// Name and identity of a policy, without its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub id: String,
    pub name: String,
}
