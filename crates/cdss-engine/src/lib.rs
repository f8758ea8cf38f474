//! Clinical Decision Support Rule Engine
//!
//! Evaluates declarative rules against a patient context and produces
//! prioritized alerts with a blocking verdict.

mod catalog;
mod context;
mod engine;
mod error;
mod model;
mod operators;
mod request;
mod source;

pub use catalog::{default_rules, DEFAULT_RULE_IDS};
pub use context::{build_context, resolve};
pub use engine::{evaluate_rules, RuleEngine};
pub use error::RuleError;
pub use model::{Action, ActionKind, Category, Condition, Literal, Operator, Priority, Rule};
pub use operators::condition_holds;
pub use request::{
    Alert, Diagnosis, EvaluationRequest, EvaluationResponse, LabResult, Medication,
};
pub use source::{ensure_unique_ids, parse_rules, DefaultCatalog, JsonRuleFile, RuleSource};
