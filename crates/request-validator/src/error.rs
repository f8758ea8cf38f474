//! Validation Error Types

use serde::Serialize;
use thiserror::Error;

/// Problems found in an evaluation request
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Required section is empty
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// A record is present but unusable
    #[error("Invalid {field}[{index}]: {reason}")]
    InvalidRecord {
        field: &'static str,
        index: usize,
        reason: String,
    },

    /// Collection larger than the configured bound
    #[error("{field} has {count} entries, limit is {max}")]
    TooMany {
        field: &'static str,
        count: usize,
        max: usize,
    },
}
