//! Health endpoint

use axum::{extract::State, Json};

use crate::health::{HealthChecker, HealthReport};
use crate::state::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthChecker::check(&state.orchestrator).await)
}
