use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::Deserialize;
use serde_json::{Value, json};

use jm_common::dataset::{MarketOutcome, market_summary};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct MarketDataRequest {
    /// Explicit column overrides from the mapping form, keyed by semantic
    /// field (role, salary, skills, experience).
    #[serde(default)]
    pub mapping: HashMap<String, String>,
}

fn market_response(
    state: &SharedState,
    overrides: &HashMap<String, String>,
) -> Result<Json<Value>, ApiError> {
    let dataset = state.dataset.read()?;

    match market_summary(&dataset, overrides) {
        MarketOutcome::Summary(summary) => serde_json::to_value(summary)
            .map(Json)
            .map_err(|err| ApiError::Internal(err.to_string())),
        // Not an error: the caller is asked to disambiguate the columns.
        MarketOutcome::MappingRequired { columns, detected } => Ok(Json(json!({
            "error": "mapping_required",
            "columns": columns,
            "detected": detected,
        }))),
    }
}

pub async fn market_data(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    market_response(&state, &HashMap::new())
}

pub async fn market_data_with_mapping(
    State(state): State<SharedState>,
    _auth: AuthUser,
    body: Option<Json<MarketDataRequest>>,
) -> Result<Json<Value>, ApiError> {
    let overrides = body.map(|Json(request)| request.mapping).unwrap_or_default();

    market_response(&state, &overrides)
}

/// Content types accepted for dataset uploads. Browsers send text/csv;
/// scripted clients often send octet-stream or nothing at all.
const UPLOAD_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "application/octet-stream",
    "text/plain",
];

pub async fn upload_csv(
    State(state): State<SharedState>,
    _auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !UPLOAD_CONTENT_TYPES.contains(&mime.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "expected a CSV body, got content type {mime}"
            )));
        }
    }

    if body.is_empty() {
        return Err(ApiError::BadRequest("request body is empty".into()));
    }

    let records = state.dataset.replace(&body)?;

    Ok(Json(json!({
        "message": "dataset uploaded",
        "records": records,
    })))
}
