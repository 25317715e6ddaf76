use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use jm_common::Candidate;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MatchCandidatesRequest {
    #[serde(default)]
    pub skills_required: Vec<String>,
    pub top_n: Option<i64>,
}

/// Wire format of one ranked candidate: the metadata columns as the corpus
/// CSV names them, plus the 0..100 score.
#[derive(Debug, Serialize)]
struct RankedCandidate {
    #[serde(flatten)]
    candidate: Candidate,
    score: f64,
}

pub async fn match_candidates(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<MatchCandidatesRequest>,
) -> Result<Json<Value>, ApiError> {
    let matcher = state.inference.matcher.as_ref().ok_or_else(|| {
        ApiError::ArtifactUnavailable("candidate index artifacts are not loaded".into())
    })?;

    let top_n = match request.top_n {
        None => 10,
        Some(n) if n > 0 => n as usize,
        Some(n) => {
            return Err(ApiError::BadRequest(format!(
                "top_n must be a positive integer, got {n}"
            )));
        }
    };

    let ranked: Vec<RankedCandidate> = matcher
        .match_candidates(&request.skills_required, top_n)
        .into_iter()
        .map(|matched| RankedCandidate {
            candidate: matched.candidate,
            score: matched.score,
        })
        .collect();

    Ok(Json(json!({ "candidates": ranked })))
}
