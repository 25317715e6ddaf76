use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use jm_common::recommend::{SkillFrequencyTable, SkillGapReport};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RecommendSkillsRequest {
    pub target_role: String,
    #[serde(default)]
    pub current_skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleSkillsRequest {
    pub target_role: String,
}

fn skill_table(state: &SharedState) -> Result<&SkillFrequencyTable, ApiError> {
    state.inference.skill_freq.as_ref().ok_or_else(|| {
        ApiError::ArtifactUnavailable("skill frequency artifacts are not loaded".into())
    })
}

pub async fn recommend_skills(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<RecommendSkillsRequest>,
) -> Result<Json<SkillGapReport>, ApiError> {
    let table = skill_table(&state)?;

    Ok(Json(
        table.recommend(&request.target_role, &request.current_skills),
    ))
}

pub async fn get_role_skills(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<RoleSkillsRequest>,
) -> Result<Json<Value>, ApiError> {
    let table = skill_table(&state)?;

    Ok(Json(json!({
        "skills": table.role_skills(&request.target_role),
    })))
}
