pub mod artifacts;
pub mod dataset;
pub mod features;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod recommend;
pub mod schema_align;

use serde::{Deserialize, Serialize};

// Commonly used data models for the inference pipeline.

/// Raw prediction request as it arrives from the HTTP layer. Role and
/// location are free text; `normalize` canonicalizes them before encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionInput {
    pub role: String,
    pub location: String,
    pub experience_years: f64,
    pub skills: Vec<String>,
}

/// One row of the candidate corpus. Positionally aligned with the
/// precomputed embedding matrix: candidate i owns matrix row i.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "Candidate ID")]
    pub candidate_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Experience Level")]
    pub experience_level: String,
    #[serde(rename = "Skills")]
    pub skills: String,
}
