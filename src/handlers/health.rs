use axum::{extract::State, http::StatusCode, response::Json};
use once_cell::sync::Lazy;
use std::time::Instant;
use tracing::info;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Process start, forced when the router is built.
pub static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let classifier_configured = state.classifier.is_configured();

    let status = if classifier_configured {
        "healthy"
    } else {
        "degraded"
    };

    info!(
        status = status,
        classifier_configured = classifier_configured,
        "Health check completed"
    );

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        model: state.classifier.model_name().to_string(),
        classifier_configured,
        uptime_seconds: STARTED_AT.elapsed().as_secs(),
    })
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.classifier.is_configured() {
        StatusCode::OK
    } else {
        info!("Readiness check failed - classifier not configured");
        StatusCode::SERVICE_UNAVAILABLE
    }
}
