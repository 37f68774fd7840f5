//! Detector catalogue endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorsResponse {
    pub detectors: Vec<Value>,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /detectors
pub async fn list_detectors(State(state): State<AppState>) -> Json<DetectorsResponse> {
    let response = match state.orchestrator.runner().list_detectors().await {
        Ok(detectors) => DetectorsResponse {
            total: detectors.len(),
            detectors,
            error: None,
        },
        Err(e) => {
            warn!("Detector listing failed: {}", e);
            DetectorsResponse {
                detectors: Vec::new(),
                total: 0,
                error: Some(e.to_string()),
            }
        }
    };
    Json(response)
}
