//! API routes

pub mod analyze;
pub mod detectors;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware::logging_middleware;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/analyze", post(analyze::analyze_contract))
        .route("/detectors", get(detectors::list_detectors))
        .layer(axum::middleware::from_fn(logging_middleware))
        .with_state(state)
}
