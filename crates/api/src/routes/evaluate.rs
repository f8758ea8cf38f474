//! Evaluation Route

use axum::{extract::State, Json};
use cdss_engine::{EvaluationRequest, EvaluationResponse};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ApiError, SharedState};

/// Evaluation result plus the history id it was stored under
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponse {
    /// Absent when the history could not be written
    pub evaluation_id: Option<Uuid>,
    #[serde(flatten)]
    pub result: EvaluationResponse,
}

/// Evaluate the active rules against a patient context
pub async fn evaluate(
    State(state): State<SharedState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let check = state.validator.validate(&request);
    if !check.valid {
        counter!("cdss_requests_rejected_total").increment(1);
        return Err(ApiError::Validation(check.errors));
    }

    let started = Instant::now();
    let result = state.engine.evaluate(&request);
    histogram!("cdss_evaluation_seconds").record(started.elapsed().as_secs_f64());
    counter!("cdss_evaluations_total").increment(1);
    counter!("cdss_alerts_total").increment(result.alerts.len() as u64);

    if !result.valid {
        counter!("cdss_blocked_evaluations_total").increment(1);
        info!(
            event = request.context_event.as_deref().unwrap_or("unspecified"),
            critical = result.critical_count(),
            "Evaluation blocked by critical alert"
        );
    }

    // history is best effort; the caller still gets its alerts
    let evaluation_id = match state
        .history
        .record(request.context_event.as_deref(), &result)
    {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to record evaluation: {}", e);
            None
        }
    };

    Ok(Json(EvaluateResponse {
        evaluation_id,
        result,
    }))
}
