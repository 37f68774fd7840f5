//! Contract analysis endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::request::AnalysisRequest;
use crate::state::AppState;

/// POST /analyze
///
/// Responds 200 with an `AnalysisResult` whenever the request is valid, even if
/// the analysis itself failed; only validation failures get a 400.
pub async fn analyze_contract(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    match state.orchestrator.analyze(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}
