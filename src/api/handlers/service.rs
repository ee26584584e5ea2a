use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::error::Result;
use crate::rpc::ServiceStatus;

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    let _guard = state.lock_device().await;
    Json(state.driver.bridge().status().await)
}

pub async fn start_service(State(state): State<Arc<AppState>>) -> Result<Json<ServiceStatus>> {
    let _guard = state.lock_device().await;
    state.driver.bridge().start().await?;
    Ok(Json(state.driver.bridge().status().await))
}

pub async fn stop_service(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    let _guard = state.lock_device().await;
    state.driver.bridge().stop().await;
    Json(state.driver.bridge().status().await)
}
