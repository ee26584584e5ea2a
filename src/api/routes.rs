use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{device, elements, health, service};
use super::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Control plane is meant for local callers only
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost"),
            HeaderValue::from_static("http://127.0.0.1"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Device commands and gestures
        .route("/device/connect", post(device::connect))
        .route("/device/run", post(device::run_command))
        .route("/device/tap", post(device::tap))
        .route("/device/long-tap", post(device::long_tap))
        .route("/device/swipe", post(device::swipe))
        // Hierarchy and elements
        .route("/hierarchy", get(elements::get_hierarchy))
        .route("/elements/find", post(elements::find_elements))
        .route("/elements/wait", post(elements::wait_element))
        .route("/elements/action", post(elements::element_action))
        // Automation service
        .route("/service/status", get(service::get_status))
        .route("/service/start", post(service::start_service))
        .route("/service/stop", post(service::stop_service))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
