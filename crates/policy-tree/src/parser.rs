//! Policy file parser.

use crate::error::Result;
use crate::policy::Policy;
use serde::Deserialize;

/// Supported policy file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Yaml,
    Json,
}

impl PolicyFormat {
    /// Detects format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Some(PolicyFormat::Yaml)
        } else if path.ends_with(".json") {
            Some(PolicyFormat::Json)
        } else {
            None
        }
    }

    /// Detects format from content.
    pub fn detect(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            PolicyFormat::Json
        } else {
            PolicyFormat::Yaml
        }
    }
}

/// Parses and validates a policy, auto-detecting format.
pub fn parse_policy(content: &str) -> Result<Policy> {
    parse_policy_with_format(content, PolicyFormat::detect(content))
}

/// Parses and validates a policy in the given format.
pub fn parse_policy_with_format(content: &str, format: PolicyFormat) -> Result<Policy> {
    match format {
        PolicyFormat::Yaml => Policy::from_yaml(content),
        PolicyFormat::Json => Policy::from_json(content),
    }
}

/// Parses every document of a multi-document YAML stream.
///
/// Each policy is validated; the first invalid one fails the whole batch.
pub fn parse_policies_yaml(content: &str) -> Result<Vec<Policy>> {
    let mut policies = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let policy: Policy = serde_yaml::from_value(value)?;
        policy.validate()?;
        policies.push(policy);
    }

    Ok(policies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;

    const SINGLE: &str = r#"
id: test
name: Test
start_condition: 0
conditions:
  - decision: 1
"#;

    #[test]
    fn test_format_detection() {
        assert_eq!(PolicyFormat::detect(r#"{"id": "test"}"#), PolicyFormat::Json);
        assert_eq!(PolicyFormat::detect("id: test"), PolicyFormat::Yaml);
        assert_eq!(PolicyFormat::from_extension("p.yml"), Some(PolicyFormat::Yaml));
        assert_eq!(PolicyFormat::from_extension("p.json"), Some(PolicyFormat::Json));
        assert_eq!(PolicyFormat::from_extension("p.toml"), None);
    }

    #[test]
    fn test_parse_yaml() {
        let policy = parse_policy(SINGLE).unwrap();
        assert_eq!(policy.id, "test");
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"id": "test", "name": "Test", "start_condition": 0, "conditions": [{"decision": 1}]}"#;
        let policy = parse_policy(json).unwrap();
        assert_eq!(policy.id, "test");
    }

    #[test]
    fn test_parse_multiple() {
        let yaml = r#"
id: policy1
name: Policy 1
start_condition: 0
conditions:
  - decision: 1
---
id: policy2
name: Policy 2
start_condition: 0
conditions:
  - decision: 2
"#;
        let policies = parse_policies_yaml(yaml).unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1].id, "policy2");
    }

    #[test]
    fn test_parse_multiple_rejects_invalid_document() {
        let yaml = r#"
id: ok
name: Ok
start_condition: 0
conditions:
  - decision: 1
---
id: no-start
name: No start
conditions:
  - decision: 2
"#;
        assert!(matches!(
            parse_policies_yaml(yaml),
            Err(PolicyError::MissingStartCondition { .. })
        ));
    }
}
