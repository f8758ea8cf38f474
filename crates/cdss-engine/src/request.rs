//! Evaluation Request and Response Types

use crate::model::{ActionKind, Category, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Medication record. Only `name` is required; every other field is kept
/// verbatim for rules that look at dose or route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Medication {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: Map::new(),
        }
    }

    /// Attach an extra field to the record
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Diagnosis record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Diagnosis {
    pub fn new(name: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            name: name.into(),
            code: code.map(str::to_string),
            details: Map::new(),
        }
    }
}

/// Single lab observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub code: String,
    #[serde(default)]
    pub value: Value,
}

impl LabResult {
    pub fn new(code: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Context submitted for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub patient_data: Map<String, Value>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub conditions: Vec<Diagnosis>,
    #[serde(default)]
    pub lab_results: Vec<LabResult>,
    /// What triggered the evaluation, e.g. "order_entry". Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_event: Option<String>,
}

impl EvaluationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.patient_data.insert(key.into(), value.into());
        self
    }

    pub fn with_medication(mut self, medication: Medication) -> Self {
        self.medications.push(medication);
        self
    }

    pub fn with_condition(mut self, diagnosis: Diagnosis) -> Self {
        self.conditions.push(diagnosis);
        self
    }

    pub fn with_lab(mut self, code: impl Into<String>, value: impl Into<Value>) -> Self {
        self.lab_results.push(LabResult::new(code, value));
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.context_event = Some(event.into());
        self
    }
}

/// Alert produced by a fired rule action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub rule_id: String,
    pub rule_name: String,
    pub category: Category,
    pub priority: Priority,
    pub action: ActionKind,
    pub message: String,
    pub suggestion: Option<String>,
    pub evidence_link: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// Alerts, most severe first
    pub alerts: Vec<Alert>,
    /// False when any alert is Critical
    pub valid: bool,
}

impl EvaluationResponse {
    /// Build a response from unsorted alerts
    pub fn from_alerts(mut alerts: Vec<Alert>) -> Self {
        // stable: equal priorities keep rule order
        alerts.sort_by_key(|alert| alert.priority);
        let valid = !alerts
            .iter()
            .any(|alert| alert.priority == Priority::Critical);
        Self { alerts, valid }
    }

    pub fn critical_count(&self) -> usize {
        self.alerts
            .iter()
            .filter(|alert| alert.priority == Priority::Critical)
            .count()
    }

    /// Whether any fired action asks the consumer to hard-stop
    pub fn has_block_action(&self) -> bool {
        self.alerts
            .iter()
            .any(|alert| alert.action == ActionKind::Block)
    }
}
