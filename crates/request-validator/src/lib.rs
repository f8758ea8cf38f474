//! Evaluation Request Validation
//!
//! Rejects requests the service cannot build a meaningful context from,
//! before they are handed to the rule engine.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
