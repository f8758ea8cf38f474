//! Rule Management Routes

use axum::{
    extract::{Query, State},
    Json,
};
use cdss_engine::{ensure_unique_ids, Category, Rule};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, SharedState};

/// Query parameters for the rule listing
#[derive(Debug, Deserialize)]
pub struct RuleQuery {
    /// Filter by enabled flag
    pub enabled: Option<bool>,
    /// Filter by category
    pub category: Option<Category>,
}

/// Response for the rule listing
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleListResponse {
    pub data: Vec<Rule>,
    pub count: usize,
}

/// Response after replacing the rule set
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleUpdateResponse {
    pub loaded: usize,
    pub source: String,
}

/// List the active rules
pub async fn list_rules(
    State(state): State<SharedState>,
    Query(params): Query<RuleQuery>,
) -> Json<RuleListResponse> {
    let data: Vec<Rule> = state
        .engine
        .rules()
        .iter()
        .filter(|r| params.enabled.map_or(true, |e| r.is_enabled() == e))
        .filter(|r| params.category.map_or(true, |c| r.category() == c))
        .cloned()
        .collect();

    Json(RuleListResponse {
        count: data.len(),
        data,
    })
}

/// Replace the active rule set with the request body
pub async fn replace_rules(
    State(state): State<SharedState>,
    Json(rules): Json<Vec<Rule>>,
) -> Result<Json<RuleUpdateResponse>, ApiError> {
    ensure_unique_ids(&rules)?;

    let loaded = rules.len();
    state.engine.load_rules(rules);
    counter!("cdss_rule_reloads_total").increment(1);
    info!("Rule set replaced via API ({} rules)", loaded);

    Ok(Json(RuleUpdateResponse {
        loaded,
        source: "api".to_string(),
    }))
}

/// Reload the rule set from the configured source
pub async fn reload_rules(
    State(state): State<SharedState>,
) -> Result<Json<RuleUpdateResponse>, ApiError> {
    let rules = state.rule_source.load()?;
    ensure_unique_ids(&rules)?;

    let loaded = rules.len();
    state.engine.load_rules(rules);
    counter!("cdss_rule_reloads_total").increment(1);

    Ok(Json(RuleUpdateResponse {
        loaded,
        source: state.rule_source.describe(),
    }))
}
