use axum::{Json, extract::State};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use jm_common::PredictionInput;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Uploaded clients send experience as a number or a numeric string;
/// anything unparseable reads as zero rather than failing the request.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[derive(Debug, Deserialize)]
pub struct PredictSalaryRequest {
    pub role: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub experience_years: f64,
    #[serde(default)]
    pub skills: Vec<String>,
}

pub async fn predict_salary(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<PredictSalaryRequest>,
) -> Result<Json<Value>, ApiError> {
    let predictor = state.inference.predictor.as_ref().ok_or_else(|| {
        ApiError::ArtifactUnavailable("salary model artifacts are not loaded".into())
    })?;

    let input = PredictionInput {
        role: request.role,
        location: request.location,
        experience_years: request.experience_years,
        skills: request.skills,
    };

    let predicted = predictor.predict(&input)?;

    Ok(Json(json!({
        "predicted_salary": (predicted * 100.0).round() / 100.0,
    })))
}
