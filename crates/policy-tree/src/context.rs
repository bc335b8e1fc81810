//! Input values supplied to a policy evaluation.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single input value, before numeric coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl InputValue {
    /// Reads the value as a number.
    ///
    /// Finite numbers pass through. Text is trimmed and parsed, and must
    /// yield a finite number. Anything else is rejected.
    pub fn as_number(&self, variable: &str) -> Result<f64> {
        let non_numeric = || PolicyError::NonNumericVariable {
            variable: variable.to_string(),
            value: self.to_string(),
        };

        match self {
            InputValue::Number(n) if n.is_finite() => Ok(*n),
            InputValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(non_numeric),
            InputValue::Number(_) => Err(non_numeric()),
            InputValue::Bool(_) | InputValue::Null => Err(non_numeric()),
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Number(n) => write!(f, "{}", n),
            InputValue::Bool(b) => write!(f, "{}", b),
            InputValue::Text(s) => write!(f, "{:?}", s),
            InputValue::Null => f.write_str("null"),
        }
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Number(value as f64)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Bool(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Text(value)
    }
}

impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => InputValue::Null,
            serde_json::Value::Bool(b) => InputValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => InputValue::Number(f),
                None => InputValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => InputValue::Text(s),
            // Arrays and objects keep their JSON text and fail coercion.
            other => InputValue::Text(other.to_string()),
        }
    }
}

/// Named input values for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationInputs {
    values: HashMap<String, InputValue>,
}

impl EvaluationInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<InputValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    /// Looks up a variable and coerces it to a number.
    pub fn number(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| PolicyError::MissingVariable(name.to_string()))?
            .as_number(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds inputs from a JSON object.
    ///
    /// A body that is not valid JSON, or not an object, is a `ParseError`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| PolicyError::ParseError(e.to_string()))?;
        Self::try_from(value)
    }
}

impl TryFrom<serde_json::Value> for EvaluationInputs {
    type Error = PolicyError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                values: map
                    .into_iter()
                    .map(|(k, v)| (k, InputValue::from(v)))
                    .collect(),
            }),
            other => Err(PolicyError::ParseError(format!(
                "inputs must be a JSON object, got {}",
                other
            ))),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EvaluationInputs
where
    K: Into<String>,
    V: Into<InputValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
