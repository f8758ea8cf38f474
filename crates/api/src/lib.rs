//! CDSS API Server
//!
//! REST API wrapping the clinical decision support rule engine.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
pub mod rate_limit;
mod routes;
pub mod settings;

pub use error::{ApiError, ErrorBody};
pub use routes::evaluate::EvaluateResponse;
pub use routes::rules::{RuleListResponse, RuleUpdateResponse};
pub use settings::Settings;

use alert_store::AlertLog;
use cdss_engine::{DefaultCatalog, JsonRuleFile, RuleEngine, RuleSource};
use rate_limit::create_governor_config;
use request_validator::Validator;

/// Application state shared across handlers
pub struct AppState {
    /// Active rules
    pub engine: RuleEngine,
    /// Where reloads read rules from
    pub rule_source: Box<dyn RuleSource>,
    /// Caller-side request checks
    pub validator: Validator,
    /// Recent evaluation outcomes
    pub history: AlertLog,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state with the rule set loaded from `rule_source`
    pub fn new(
        rule_source: Box<dyn RuleSource>,
        validator: Validator,
        history: AlertLog,
    ) -> Result<Self, ApiError> {
        let rules = rule_source.load()?;
        info!("Loaded {} rules from {}", rules.len(), rule_source.describe());

        Ok(Self {
            engine: RuleEngine::with_rules(rules),
            rule_source,
            validator,
            history,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        })
    }

    /// Create state as described by the settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let rule_source: Box<dyn RuleSource> = match &settings.rules.path {
            Some(path) => Box::new(JsonRuleFile::new(path)),
            None => Box::new(DefaultCatalog),
        };

        Self::new(
            rule_source,
            Validator::new(settings.validation.clone()),
            AlertLog::new(settings.history.max_records),
        )
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub rules: RuleHealth,
    pub history: HistoryHealth,
}

#[derive(Debug, Serialize)]
pub struct RuleHealth {
    pub source: String,
    pub loaded: usize,
    pub enabled: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryHealth {
    pub records: usize,
    pub blocked: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/cdss/evaluate", post(routes::evaluate::evaluate))
        .route(
            "/api/v1/cdss/rules",
            get(routes::rules::list_rules).put(routes::rules::replace_rules),
        )
        .route("/api/v1/cdss/rules/reload", post(routes::rules::reload_rules))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:id", get(routes::alerts::get_alert))
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let rules = state.engine.rules();
    let enabled = rules.iter().filter(|r| r.is_enabled()).count();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            rules: RuleHealth {
                source: state.rule_source.describe(),
                loaded: rules.len(),
                enabled,
            },
            history: HistoryHealth {
                records: state.history.len(),
                blocked: state.history.blocked_count(),
            },
        },
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(settings: &settings::LoggingSettings) -> Result<(), ApiError> {
    let parsed = Level::from_str(&settings.level);
    let level = parsed.as_ref().map_or(Level::INFO, |level| *level);

    let result = if settings.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| ApiError::Startup(format!("failed to set tracing subscriber: {e}")))?;

    if parsed.is_err() {
        warn!("Unknown log level '{}', using info", settings.level);
    }
    Ok(())
}

/// Run the server until ctrl-c
pub async fn run_server(settings: Settings) -> Result<(), ApiError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Startup(format!("failed to install metrics recorder: {e}")))?;

    let state = Arc::new(AppState::from_settings(&settings)?.with_metrics(handle));
    let mut app = create_router(state);

    if settings.rate_limit.enabled {
        let config = create_governor_config(&settings.rate_limit)?;
        app = app.layer(GovernorLayer { config });
    } else {
        warn!("Rate limiting disabled");
    }

    info!("Starting API server on {}", settings.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
