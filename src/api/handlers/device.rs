//! Device command and gesture handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::device::SwipePlan;
use crate::error::Result;
use crate::hierarchy::Bounds;
use crate::models::{
    ConnectRequest, ConnectResponse, GenericResponse, PointRequest, RunRequest, RunResponse,
    SwipeRequest,
};

/// Default ratio when a swipe request names explicit bounds
const RANGE_SWIPE_RATIO: f64 = 0.5;

pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>> {
    let _guard = state.lock_device().await;
    tracing::info!("Connecting to device '{}'", request.device);

    state.driver.connect(&request.device).await?;

    Ok(Json(ConnectResponse {
        device: state.driver.session().device().await,
        mode: state.driver.session().mode(),
    }))
}

pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>> {
    let _guard = state.lock_device().await;
    let output = state.driver.run(&request.command, request.args.as_slice()).await?;
    Ok(Json(RunResponse { output }))
}

pub async fn tap(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointRequest>,
) -> Result<Json<GenericResponse>> {
    let _guard = state.lock_device().await;
    state.driver.tap(request.x, request.y).await?;
    Ok(Json(GenericResponse::ok()))
}

pub async fn long_tap(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointRequest>,
) -> Result<Json<GenericResponse>> {
    let _guard = state.lock_device().await;
    state.driver.long_tap(request.x, request.y).await?;
    Ok(Json(GenericResponse::ok()))
}

/// Full-screen swipe, or a swipe inside `bounds` when given
pub async fn swipe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SwipeRequest>,
) -> Result<Json<SwipePlan>> {
    let _guard = state.lock_device().await;

    let plan = match (request.bounds, request.ratio) {
        (None, None) if request.duration_ms == 0 => state.driver.swipe(request.direction).await?,
        (bounds, ratio) => {
            let bounds: Bounds = match bounds {
                Some(bounds) => bounds,
                None => {
                    let (width, height) = state.driver.resolution().await?;
                    Bounds::from_size(width, height)
                }
            };
            state
                .driver
                .swipe_in_range(
                    &bounds,
                    request.direction,
                    request.duration_ms,
                    ratio.unwrap_or(RANGE_SWIPE_RATIO),
                )
                .await?
        }
    };

    Ok(Json(plan))
}
