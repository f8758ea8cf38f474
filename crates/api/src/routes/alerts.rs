//! Alert History Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use alert_store::{AlertFilter, EvaluationRecord};
use cdss_engine::Priority;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, SharedState};

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Keep evaluations with an alert at least this severe (1-5)
    pub min_severity: Option<Priority>,
    /// Keep evaluations where this rule fired
    pub rule_id: Option<String>,
    /// Keep only evaluations that were not valid
    #[serde(default)]
    pub blocked_only: bool,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct AlertResponse {
    pub data: Vec<EvaluationRecord>,
    pub count: usize,
    pub blocked_count: usize,
}

/// List recent evaluations
pub async fn get_alerts(
    State(state): State<SharedState>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let limit = params.limit.min(500);
    let filter = AlertFilter {
        min_severity: params.min_severity,
        rule_id: params.rule_id,
        blocked_only: params.blocked_only,
    };

    let data = state.history.recent(&filter, limit)?;
    let blocked_count = data.iter().filter(|r| !r.valid).count();

    Ok(Json(AlertResponse {
        count: data.len(),
        blocked_count,
        data,
    }))
}

/// Fetch one evaluation by id
pub async fn get_alert(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluationRecord>, ApiError> {
    Ok(Json(state.history.get(id)?))
}
