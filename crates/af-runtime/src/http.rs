//! Metrics and health endpoints.

use af_01_state_store::StateStore;
use af_04_orchestrator::{ScraperOrchestrator, ScraperStatsEntry};
use af_telemetry::MetricsFacade;
use axum::{
    extract::State,
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::error;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Application state shared across handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<StateStore>,
    pub orchestrators: Arc<Vec<Arc<ScraperOrchestrator>>>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn metrics_handler(
    State(state): State<HttpState>,
) -> Result<([(header::HeaderName, &'static str); 1], String), (StatusCode, String)> {
    match MetricsFacade::render(&state.store) {
        Ok(body) => Ok(([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body)),
        Err(e) => {
            error!(error = %e, "Metrics rendering failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub async fn health_handler(State(state): State<HttpState>) -> Json<serde_json::Value> {
    let scrapers: Vec<ScraperStatsEntry> = state
        .orchestrators
        .iter()
        .flat_map(|orchestrator| orchestrator.stats())
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "networks": state.store.networks(),
        "scrapers": scrapers,
    }))
}
