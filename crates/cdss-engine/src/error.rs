//! Rule Construction Error Types

use thiserror::Error;

/// Errors raised while building or loading rules.
///
/// Evaluation never produces one of these: bad request data only keeps
/// a rule from firing.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Operator name outside the supported set
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Category name outside the supported set
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Priority value outside 1..=5
    #[error("Unknown priority: {0} (expected 1-5)")]
    UnknownPriority(u8),

    /// Literal type does not fit the operator
    #[error("Operator {operator} requires a {expected} value")]
    LiteralMismatch {
        operator: &'static str,
        expected: &'static str,
    },

    /// Field path is empty or has an empty segment
    #[error("Invalid field path: {0:?}")]
    InvalidField(String),

    /// Rule id is blank
    #[error("Rule id must not be empty")]
    EmptyId,

    /// Two rules in one set share an id
    #[error("Duplicate rule id: {0}")]
    DuplicateId(String),

    /// Rule file could not be read
    #[error("Failed to read rule source: {0}")]
    Io(#[from] std::io::Error),

    /// Rule file could not be parsed
    #[error("Failed to parse rule source: {0}")]
    Parse(#[from] serde_json::Error),
}
