//! Evaluation History
//!
//! Keeps the outcome of recent evaluations so they can be reviewed later.
//! The rule engine never stores alerts itself; the service records them here.

mod repository;

pub use repository::{AlertFilter, AlertLog, EvaluationRecord};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("Record not found")]
    NotFound,
}
