//! HTTP control plane
//!
//! Exposes the driver over a small axum API. Every handler that touches the
//! device holds `AppState::lock_device` for its whole duration.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
