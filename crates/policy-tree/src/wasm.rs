//! WASM bindings for the policy engine.

#![cfg(feature = "wasm")]

use crate::context::EvaluationInputs;
use crate::policy::Policy;
use crate::store::{MemoryPolicyStore, PolicyStore};
use wasm_bindgen::prelude::*;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-compatible policy engine wrapper.
#[wasm_bindgen]
pub struct WasmPolicyEngine {
    store: MemoryPolicyStore,
}

#[wasm_bindgen]
impl WasmPolicyEngine {
    /// Creates a new WASM policy engine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            store: MemoryPolicyStore::new(),
        }
    }

    /// Publishes a policy from a YAML string. Returns its fingerprint.
    #[wasm_bindgen]
    pub fn load_policy_yaml(&self, yaml: &str) -> Result<String, JsValue> {
        let policy = Policy::from_yaml(yaml).map_err(to_js)?;
        let snapshot = self.store.publish(policy).map_err(to_js)?;
        Ok(snapshot.fingerprint().to_string())
    }

    /// Publishes a policy from a JSON string. Returns its fingerprint.
    #[wasm_bindgen]
    pub fn load_policy_json(&self, json: &str) -> Result<String, JsValue> {
        let policy = Policy::from_json(json).map_err(to_js)?;
        let snapshot = self.store.publish(policy).map_err(to_js)?;
        Ok(snapshot.fingerprint().to_string())
    }

    /// Evaluates a policy against inputs given as a JSON object.
    /// Returns the decision as a JSON string.
    #[wasm_bindgen]
    pub fn evaluate(&self, policy_id: &str, inputs_json: &str) -> Result<String, JsValue> {
        let inputs = EvaluationInputs::from_json(inputs_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid inputs: {}", e)))?;

        let decision = self.store.evaluate(policy_id, &inputs).map_err(to_js)?;

        serde_json::to_string(&decision).map_err(to_js)
    }

    /// Removes a policy.
    #[wasm_bindgen]
    pub fn remove_policy(&self, policy_id: &str) -> Result<(), JsValue> {
        self.store.remove(policy_id).map(|_| ()).map_err(to_js)
    }

    /// Ids of the loaded policies, ordered.
    #[wasm_bindgen]
    pub fn policy_ids(&self) -> Vec<String> {
        self.store.list().into_iter().map(|s| s.id).collect()
    }

    /// Returns the number of loaded policies.
    #[wasm_bindgen]
    pub fn policy_count(&self) -> usize {
        self.store.len()
    }
}

impl Default for WasmPolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the fingerprint of a policy given as JSON.
#[wasm_bindgen]
pub fn fingerprint(policy_json: &str) -> Result<String, JsValue> {
    let policy = Policy::from_json(policy_json).map_err(to_js)?;
    crate::hash::policy_fingerprint(&policy).map_err(to_js)
}

/// Returns the version of the policy engine.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasm_engine() {
        let engine = WasmPolicyEngine::new();

        let policy_yaml = r#"
id: test
name: Test
start_condition: 0
conditions:
  - variable: score
    operator: ">="
    threshold: 50
    when_true: 1
    when_false: 2
  - decision: 1
  - decision: 0
"#;

        engine.load_policy_yaml(policy_yaml).unwrap();
        assert_eq!(engine.policy_count(), 1);
        assert_eq!(engine.policy_ids(), vec!["test".to_string()]);

        let decision = engine.evaluate("test", r#"{"score": "75"}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&decision).unwrap();
        assert_eq!(value["decision"], serde_json::json!(1.0));
    }
}
