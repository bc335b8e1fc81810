//! Comparison operators available to branching nodes.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric comparison between an input value and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Equal,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
        }
    }

    /// Applies the operator as `input <op> threshold`.
    ///
    /// Equality is exact IEEE comparison, with no tolerance.
    #[allow(clippy::float_cmp)]
    pub fn apply(&self, input: f64, threshold: f64) -> bool {
        match self {
            Operator::Equal => input == threshold,
            Operator::LessThan => input < threshold,
            Operator::LessThanOrEqual => input <= threshold,
            Operator::GreaterThan => input > threshold,
            Operator::GreaterThanOrEqual => input >= threshold,
        }
    }
}

impl FromStr for Operator {
    type Err = PolicyError;

    fn from_str(symbol: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.symbol() == symbol)
            .ok_or_else(|| PolicyError::UnsupportedOperator(symbol.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

/// Compares `input` against `threshold` using the operator named by `symbol`.
pub fn compare(symbol: &str, input: f64, threshold: f64) -> Result<bool> {
    let operator: Operator = symbol.parse()?;
    Ok(operator.apply(input, threshold))
}
