use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::state::AppState;
use crate::models::HealthResponse;

/// Liveness probe; never touches the device
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        mode: state.driver.session().mode(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
