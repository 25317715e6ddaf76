use axum::{Json, extract::State};
use serde_json::json;

use crate::SharedState;
use crate::error::ApiError;

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready as long as the process accepts requests; the artifact map tells
/// operators which feature groups actually loaded. A missing group degrades
/// its own endpoints to 503 without making the whole process unready.
pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    Ok(Json(json!({
        "status": "ok",
        "application": env!("CARGO_PKG_NAME"),
        "artifacts": {
            "predictor": state.inference.predictor.is_some(),
            "skill_frequency": state.inference.skill_freq.is_some(),
            "candidate_index": state.inference.matcher.is_some(),
        },
        "dataset": state.dataset.exists(),
    })))
}
