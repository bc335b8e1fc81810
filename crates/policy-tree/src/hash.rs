//! Content fingerprints for policy snapshots.

use crate::error::Result;
use crate::policy::Policy;
use crate::types::{ConditionNode, NodeId};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Prefix on every policy fingerprint.
pub const FINGERPRINT_PREFIX: &str = "p:";

/// Computes SHA-256 hash of data and returns hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// The hashed part of a policy.
///
/// Every field is a struct field with a fixed order and there are no maps,
/// so compact JSON of this view is already canonical.
#[derive(Serialize)]
struct Fingerprinted<'a> {
    id: &'a str,
    name: &'a str,
    description: Option<&'a str>,
    start_condition: Option<NodeId>,
    conditions: &'a [ConditionNode],
}

impl<'a> From<&'a Policy> for Fingerprinted<'a> {
    fn from(policy: &'a Policy) -> Self {
        Self {
            id: &policy.id,
            name: &policy.name,
            description: policy.description.as_deref(),
            start_condition: policy.start_condition,
            conditions: &policy.conditions,
        }
    }
}

/// Fingerprint of a policy's decision-relevant content.
///
/// Covers id, name, description, start condition and nodes. Metadata is
/// left out, so annotating a policy does not change its fingerprint.
pub fn policy_fingerprint(policy: &Policy) -> Result<String> {
    let bytes = serde_json::to_vec(&Fingerprinted::from(policy))?;
    Ok(format!("{}{}", FINGERPRINT_PREFIX, sha256_hex(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;
    use crate::types::NodeId;

    fn sample() -> Policy {
        let mut builder = PolicyBuilder::new("p", "Sample");
        let root = builder.add_branch("x", "<", 3.0, NodeId(1), NodeId(2));
        builder.add_decision(1.0);
        builder.add_decision(2.0);
        builder.start(root);
        builder.build()
    }

    #[test]
    fn test_sha256() {
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = policy_fingerprint(&sample()).unwrap();
        assert!(fp.starts_with(FINGERPRINT_PREFIX));
        assert_eq!(fp.len(), FINGERPRINT_PREFIX.len() + 64);
    }

    #[test]
    fn test_fingerprint_ignores_metadata() {
        let plain = sample();
        let mut annotated = sample();
        annotated
            .metadata
            .insert("owner".to_string(), serde_json::json!("risk-team"));

        assert_eq!(
            policy_fingerprint(&plain).unwrap(),
            policy_fingerprint(&annotated).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_tracks_tree_changes() {
        let before = sample();
        let mut after = sample();
        after.conditions[0].threshold = Some(4.0);

        assert_ne!(
            policy_fingerprint(&before).unwrap(),
            policy_fingerprint(&after).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_hashes_compact_json() {
        let mut builder = PolicyBuilder::new("p", "N");
        let d = builder.add_decision(1.0);
        builder.start(d);

        let expected = sha256_hex(
            br#"{"id":"p","name":"N","description":null,"start_condition":0,"conditions":[{"decision":1.0}]}"#,
        );
        assert_eq!(
            policy_fingerprint(&builder.build()).unwrap(),
            format!("{}{}", FINGERPRINT_PREFIX, expected)
        );
    }

    #[test]
    fn test_fingerprint_independent_of_source_key_order() {
        let a = Policy::from_json(
            r#"{"id":"p","name":"N","start_condition":0,"conditions":[{"decision":1}]}"#,
        )
        .unwrap();
        let b = Policy::from_json(
            r#"{"conditions":[{"decision":1}],"start_condition":0,"name":"N","id":"p"}"#,
        )
        .unwrap();
        assert_eq!(policy_fingerprint(&a).unwrap(), policy_fingerprint(&b).unwrap());
    }
}
