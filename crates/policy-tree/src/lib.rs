//! Policy Tree Engine
//!
//! Validates and evaluates decision-tree policies: binary trees of numeric
//! comparisons over named inputs that end in a numeric decision. Compiles to
//! both WASM and native.
//!
//! ```
//! use policy_tree::prelude::*;
//!
//! let mut builder = PolicyBuilder::new("credit", "Credit limit");
//! let adult = builder.add_decision(1000.0);
//! let minor = builder.add_decision(0.0);
//! let root = builder.add_branch("age", Operator::GreaterThan, 18.0, adult, minor);
//! builder.start(root);
//! let policy = builder.build_validated().unwrap();
//!
//! let inputs = EvaluationInputs::new().with("age", 25i64);
//! assert_eq!(PolicyEvaluator::new().evaluate(&policy, &inputs).unwrap(), 1000.0);
//! ```

pub mod context;
pub mod decision;
pub mod error;
pub mod evaluator;
pub mod hash;
pub mod operator;
pub mod parser;
pub mod policy;
pub mod store;
pub mod types;
pub mod validator;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use context::{EvaluationInputs, InputValue};
pub use decision::PolicyDecision;
pub use error::{ErrorClass, PolicyError, Result};
pub use evaluator::{evaluate, EvaluatorConfig, PolicyEvaluator};
pub use operator::{compare, Operator};
pub use policy::{Policy, PolicyBuilder};
pub use store::{MemoryPolicyStore, PolicySnapshot, PolicyStore};
pub use types::{ConditionNode, NodeId};
pub use validator::validate;

/// Version of the policy engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::context::{EvaluationInputs, InputValue};
    pub use crate::decision::PolicyDecision;
    pub use crate::error::{ErrorClass, PolicyError, Result};
    pub use crate::evaluator::{EvaluatorConfig, PolicyEvaluator};
    pub use crate::operator::Operator;
    pub use crate::policy::{Policy, PolicyBuilder};
    pub use crate::store::{MemoryPolicyStore, PolicySnapshot, PolicyStore};
    pub use crate::types::*;
}
