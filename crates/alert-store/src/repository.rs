//! Alert Log Implementation

use crate::StorageError;
use cdss_engine::{Alert, EvaluationResponse, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// One stored evaluation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub context_event: Option<String>,
    pub valid: bool,
    pub alerts: Vec<Alert>,
}

impl EvaluationRecord {
    /// Most severe alert priority in this record
    pub fn top_priority(&self) -> Option<Priority> {
        self.alerts.iter().map(|a| a.priority).min()
    }
}

/// Query filter for stored evaluations
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Keep records with an alert at least this severe
    pub min_severity: Option<Priority>,
    /// Keep records where this rule fired
    pub rule_id: Option<String>,
    /// Keep only records that were not valid
    pub blocked_only: bool,
}

impl AlertFilter {
    pub fn matches(&self, record: &EvaluationRecord) -> bool {
        if self.blocked_only && record.valid {
            return false;
        }

        if let Some(min) = self.min_severity {
            if !record.top_priority().is_some_and(|p| p <= min) {
                return false;
            }
        }

        if let Some(rule_id) = &self.rule_id {
            if !record.alerts.iter().any(|a| &a.rule_id == rule_id) {
                return false;
            }
        }

        true
    }
}

/// In-memory evaluation history with a retention bound
pub struct AlertLog {
    records: Mutex<VecDeque<EvaluationRecord>>,
    max_records: usize,
}

impl AlertLog {
    /// Create a log keeping at most `max_records` evaluations
    pub fn new(max_records: usize) -> Self {
        info!("Creating alert log (retention: {} evaluations)", max_records);
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records.min(10_000))),
            max_records: max_records.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<EvaluationRecord>>, StorageError> {
        self.records
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Store an evaluation outcome, evicting the oldest when full
    pub fn record(
        &self,
        context_event: Option<&str>,
        response: &EvaluationResponse,
    ) -> Result<Uuid, StorageError> {
        let record = EvaluationRecord {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            context_event: context_event.map(str::to_string),
            valid: response.valid,
            alerts: response.alerts.clone(),
        };
        let id = record.id;

        let mut records = self.lock()?;
        while records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(record);

        debug!("Recorded evaluation {} ({} alerts)", id, response.alerts.len());
        Ok(id)
    }

    /// Newest first, filtered
    pub fn recent(
        &self,
        filter: &AlertFilter,
        limit: usize,
    ) -> Result<Vec<EvaluationRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Look up one evaluation by id
    pub fn get(&self, id: Uuid) -> Result<EvaluationRecord, StorageError> {
        let records = self.lock()?;
        records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Number of stored evaluations
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored evaluations that were not valid
    pub fn blocked_count(&self) -> usize {
        self.records
            .lock()
            .map(|r| r.iter().filter(|rec| !rec.valid).count())
            .unwrap_or(0)
    }

    /// Drop all history
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}
