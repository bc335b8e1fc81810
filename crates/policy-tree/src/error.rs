//! Error types for the policy engine.

use crate::types::{Branch, NodeId};
use thiserror::Error;

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur while loading, validating or evaluating a policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The policy has no start node, or it does not resolve.
    #[error("Policy '{policy_id}' has no valid start condition")]
    MissingStartCondition { policy_id: String },

    /// A node is neither a clean branch nor a clean decision.
    #[error("Condition {node} is malformed: {reason}")]
    MalformedNode { node: NodeId, reason: String },

    /// A branch points at a node that does not exist in the policy.
    #[error("Condition {node} has a {branch} branch to missing condition {target}")]
    DanglingReference {
        node: NodeId,
        branch: Branch,
        target: NodeId,
    },

    /// A path from the start node revisits a node.
    #[error("Policy contains a cycle through condition {node}")]
    CyclicPolicy { node: NodeId },

    /// An input variable used by the walked path was not supplied.
    #[error("Variable '{0}' is missing in the input data")]
    MissingVariable(String),

    /// An input variable could not be read as a number.
    #[error("Variable '{variable}' must be a numeric value, got {value}")]
    NonNumericVariable { variable: String, value: String },

    /// A branch uses a comparison symbol the engine does not know.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// The walk ended without reaching a decision node.
    #[error("Policy '{policy_id}' evaluation failed: no decision reached ({reason})")]
    NoDecisionReached { policy_id: String, reason: String },

    /// The policy id or name is empty or only whitespace.
    #[error("Policy {field} must not be blank")]
    BlankIdentity { field: &'static str },

    /// Policy document could not be parsed.
    #[error("Failed to parse policy: {0}")]
    ParseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Policy not found.
    #[error("Policy not found: {0}")]
    NotFound(String),

}

/// Who is responsible for an error, and therefore how it should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller supplied bad input.
    Client,
    /// The stored policy is invalid.
    PolicyData,
    /// The validator was bypassed or is wrong. Alert on these.
    Invariant,
    /// Loading, lookup and encoding failures outside evaluation.
    Operational,
}

impl PolicyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PolicyError::MissingVariable(_)
            | PolicyError::NonNumericVariable { .. }
            | PolicyError::UnsupportedOperator(_) => ErrorClass::Client,

            PolicyError::MissingStartCondition { .. }
            | PolicyError::MalformedNode { .. }
            | PolicyError::DanglingReference { .. }
            | PolicyError::CyclicPolicy { .. } => ErrorClass::PolicyData,

            PolicyError::NoDecisionReached { .. } => ErrorClass::Invariant,

            PolicyError::BlankIdentity { .. }
            | PolicyError::ParseError(_)
            | PolicyError::SerializationError(_)
            | PolicyError::NotFound(_) => ErrorClass::Operational,
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            PolicyError::NotFound(_) => 404,
            PolicyError::ParseError(_) | PolicyError::BlankIdentity { .. } => 400,
            _ => match self.class() {
                ErrorClass::Client => 400,
                _ => 500,
            },
        }
    }

    /// Returns true for the structural errors the validator reports.
    pub fn is_structural(&self) -> bool {
        self.class() == ErrorClass::PolicyData
    }

    /// No engine error is worth retrying with the same policy and input.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for PolicyError {
    fn from(err: serde_yaml::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(
            PolicyError::MissingVariable("age".into()).class(),
            ErrorClass::Client
        );
        assert_eq!(
            PolicyError::UnsupportedOperator("!=".into()).class(),
            ErrorClass::Client
        );
        assert_eq!(
            PolicyError::CyclicPolicy { node: NodeId(0) }.class(),
            ErrorClass::PolicyData
        );
        assert_eq!(
            PolicyError::NoDecisionReached {
                policy_id: "p".into(),
                reason: "dead end".into()
            }
            .class(),
            ErrorClass::Invariant
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PolicyError::MissingVariable("age".into()).status_code(), 400);
        assert_eq!(
            PolicyError::MissingStartCondition { policy_id: "p".into() }.status_code(),
            500
        );
        assert_eq!(PolicyError::NotFound("p".into()).status_code(), 404);
        assert_eq!(PolicyError::ParseError("eof".into()).status_code(), 400);
        assert_eq!(PolicyError::BlankIdentity { field: "name" }.status_code(), 400);
        assert_eq!(
            PolicyError::SerializationError("io".into()).status_code(),
            500
        );
        assert!(!PolicyError::NotFound("p".into()).is_retryable());
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = PolicyError::DanglingReference {
            node: NodeId(2),
            branch: Branch::False,
            target: NodeId(9),
        };
        assert_eq!(
            err.to_string(),
            "Condition 2 has a false branch to missing condition 9"
        );
        assert!(err.is_structural());
    }
}
