//! End-to-end tests against a live server on an ephemeral port

use alert_store::AlertLog;
use api::{create_router, AppState, EvaluateResponse, RuleListResponse, RuleUpdateResponse};
use cdss_engine::{DefaultCatalog, Priority, DEFAULT_RULE_IDS};
use request_validator::Validator;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

async fn spawn_app() -> String {
    let state = AppState::new(Box::new(DefaultCatalog), Validator::default(), AlertLog::new(100))
        .expect("default catalog loads");
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn hyperkalemia_request() -> Value {
    json!({
        "patient_data": {"age": 58, "sex": "M"},
        "medications": [{"name": "Spironolactone"}],
        "conditions": [{"name": "Chronic kidney disease", "code": "N18.4"}],
        "lab_results": [{"code": "K", "value": 6.8}],
        "context_event": "lab_result"
    })
}

#[tokio::test]
async fn test_health() {
    let base = spawn_app().await;
    let body: Value = reqwest::get(format!("{base}/api/v1/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["rules"]["loaded"], DEFAULT_RULE_IDS.len());
    assert_eq!(body["components"]["rules"]["source"], "built-in catalog");
    assert_eq!(body["components"]["history"]["records"], 0);
}

#[tokio::test]
async fn test_evaluate_critical_and_history() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/cdss/evaluate"))
        .json(&hyperkalemia_request())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: EvaluateResponse = response.json().await.unwrap();
    assert!(!body.result.valid);
    assert_eq!(body.result.alerts.len(), 1);
    assert_eq!(body.result.alerts[0].rule_id, "critical_potassium");
    assert_eq!(body.result.alerts[0].priority, Priority::Critical);

    let id = body.evaluation_id.expect("evaluation recorded");
    let record: Value = client
        .get(format!("{base}/api/v1/alerts/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["context_event"], "lab_result");
    assert_eq!(record["valid"], false);

    let blocked: Value = client
        .get(format!("{base}/api/v1/alerts?blocked_only=true&min_severity=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blocked["count"], 1);
    assert_eq!(blocked["blocked_count"], 1);
}

#[tokio::test]
async fn test_evaluate_without_alerts() {
    let base = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/cdss/evaluate"))
        .json(&json!({
            "patient_data": {"age": 30},
            "lab_results": [{"code": "K", "value": 4.1}]
        }))
        .send()
        .await
        .unwrap();

    let body: EvaluateResponse = response.json().await.unwrap();
    assert!(body.result.valid);
    assert!(body.result.alerts.is_empty());
}

#[tokio::test]
async fn test_evaluate_rejects_empty_context() {
    let base = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/cdss/evaluate"))
        .json(&json!({"lab_results": [{"code": "", "value": 1}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Request failed validation");
    assert_eq!(body["details"][0]["kind"], "missing_field");
    assert_eq!(body["details"][1]["kind"], "invalid_record");
}

#[tokio::test]
async fn test_list_rules_with_filters() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let all: RuleListResponse = client
        .get(format!("{base}/api/v1/cdss/rules"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.count, DEFAULT_RULE_IDS.len());

    let best_practice: RuleListResponse = client
        .get(format!("{base}/api/v1/cdss/rules?category=best_practice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<_> = best_practice.data.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["nsaid_older_adult", "diabetes_statin"]);

    let disabled: RuleListResponse = client
        .get(format!("{base}/api/v1/cdss/rules?enabled=false"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(disabled.count, 0);
}

#[tokio::test]
async fn test_replace_and_reload_rules() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let rules = json!([{
        "id": "hba1c_high",
        "name": "HbA1c above 9%",
        "category": "critical_lab",
        "priority": 1,
        "conditions": [{"field": "labs.HbA1c", "operator": "greater_than", "value": 9.0}],
        "actions": [{"type": "alert", "message": "HbA1c critically elevated"}]
    }]);
    let update: RuleUpdateResponse = client
        .put(format!("{base}/api/v1/cdss/rules"))
        .json(&rules)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(update.loaded, 1);

    let body: EvaluateResponse = client
        .post(format!("{base}/api/v1/cdss/evaluate"))
        .json(&json!({
            "patient_data": {"age": 49},
            "lab_results": [{"code": "HbA1c", "value": 9.5}, {"code": "K", "value": 6.9}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.result.alerts.len(), 1);
    assert_eq!(body.result.alerts[0].rule_id, "hba1c_high");

    let reload: RuleUpdateResponse = client
        .post(format!("{base}/api/v1/cdss/rules/reload"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reload.loaded, DEFAULT_RULE_IDS.len());
    assert_eq!(reload.source, "built-in catalog");
}

#[tokio::test]
async fn test_replace_rules_rejects_bad_sets() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let duplicate = json!([
        {"id": "a", "name": "A", "category": "best_practice", "priority": 3},
        {"id": "a", "name": "B", "category": "best_practice", "priority": 3}
    ]);
    let response = client
        .put(format!("{base}/api/v1/cdss/rules"))
        .json(&duplicate)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown_operator = json!([{
        "id": "x", "name": "X", "category": "best_practice", "priority": 3,
        "conditions": [{"field": "labs.K", "operator": "roughly", "value": 5.0}]
    }]);
    let response = client
        .put(format!("{base}/api/v1/cdss/rules"))
        .json(&unknown_operator)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // the active set is untouched
    let all: RuleListResponse = client
        .get(format!("{base}/api/v1/cdss/rules"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.count, DEFAULT_RULE_IDS.len());
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let base = spawn_app().await;
    let response = reqwest::get(format!("{base}/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_alert_id() {
    let base = spawn_app().await;
    let response = reqwest::get(format!(
        "{base}/api/v1/alerts/00000000-0000-4000-8000-000000000000"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
