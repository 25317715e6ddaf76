use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::Candidate;
use crate::features::{
    CategoricalEncoder, FeatureSchema, GradientBoostedModel, SalaryPredictor, SkillEncoder,
};
use crate::matching::{CandidateMatcher, SparseRow, TfidfVectorizer};
use crate::recommend::{SkillFrequency, SkillFrequencyTable};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("artifact mismatch: {0}")]
    Mismatch(String),
}

fn load_json<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Result<T, ArtifactError> {
    let path = dir.join(name);
    let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json { path, source })
}

fn load_candidates(dir: &Path) -> Result<Vec<Candidate>, ArtifactError> {
    let path = dir.join("candidates.csv");
    let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    reader
        .deserialize()
        .collect::<Result<Vec<Candidate>, csv::Error>>()
        .map_err(|source| ArtifactError::Csv { path, source })
}

/// Load the salary-prediction group and verify the pieces agree before any
/// request can reach them: the frozen column list must be exactly as wide as
/// the encoder output (two categorical columns plus experience plus one per
/// known skill), and the model must not reference features beyond it.
pub fn load_predictor(dir: &Path) -> Result<SalaryPredictor, ArtifactError> {
    let encoder: CategoricalEncoder = load_json(dir, "categorical_encoder.json")?;
    let skills: SkillEncoder = load_json(dir, "skill_encoder.json")?;
    let schema: FeatureSchema = load_json(dir, "feature_columns.json")?;
    let model: GradientBoostedModel = load_json(dir, "salary_model.json")?;

    let expected_width = 3 + skills.len();
    if schema.len() != expected_width {
        return Err(ArtifactError::Mismatch(format!(
            "feature_columns has {} columns but the encoders produce {expected_width}",
            schema.len()
        )));
    }

    if let Some(max_index) = model.max_feature_index() {
        if max_index >= schema.len() {
            return Err(ArtifactError::Mismatch(format!(
                "model references feature index {max_index} outside the {}-column schema",
                schema.len()
            )));
        }
    }

    Ok(SalaryPredictor {
        encoder,
        skills,
        schema,
        model,
    })
}

pub fn load_skill_frequency(dir: &Path) -> Result<SkillFrequencyTable, ArtifactError> {
    let rows: Vec<SkillFrequency> = load_json(dir, "skill_frequency.json")?;
    Ok(SkillFrequencyTable::new(rows))
}

/// Load the candidate-matching group: the fitted vectorizer, the precomputed
/// embedding matrix, and the metadata table. Row counts must line up with the
/// metadata and column indices with the vectorizer vocabulary, otherwise
/// scores would silently attach to the wrong candidates.
pub fn load_candidate_matcher(dir: &Path) -> Result<CandidateMatcher, ArtifactError> {
    let vectorizer: TfidfVectorizer = load_json(dir, "candidate_vectorizer.json")?;
    let matrix: Vec<SparseRow> = load_json(dir, "candidate_matrix.json")?;
    let candidates = load_candidates(dir)?;

    if matrix.len() != candidates.len() {
        return Err(ArtifactError::Mismatch(format!(
            "candidate_matrix has {} rows but candidates.csv has {}",
            matrix.len(),
            candidates.len()
        )));
    }

    let width = vectorizer.vocabulary_size();
    if let Some(max_index) = matrix.iter().filter_map(SparseRow::max_index).max() {
        if max_index >= width {
            return Err(ArtifactError::Mismatch(format!(
                "candidate_matrix references term index {max_index} outside the \
                 {width}-term vocabulary"
            )));
        }
    }

    Ok(CandidateMatcher {
        vectorizer,
        matrix,
        candidates,
    })
}

/// Process-wide read-only inference state, loaded once at startup and shared
/// by reference into every request handler. Each artifact group loads
/// independently: a failed group leaves its slot empty and takes only its own
/// endpoints out of service.
#[derive(Debug, Default)]
pub struct InferenceContext {
    pub predictor: Option<SalaryPredictor>,
    pub skill_freq: Option<SkillFrequencyTable>,
    pub matcher: Option<CandidateMatcher>,
}

impl InferenceContext {
    pub fn load(assets_dir: &Path) -> Self {
        let predictor = match load_predictor(assets_dir) {
            Ok(predictor) => {
                info!(columns = predictor.schema.len(), "salary predictor loaded");
                Some(predictor)
            }
            Err(err) => {
                warn!(error = %err, "salary predictor unavailable");
                None
            }
        };

        let skill_freq = match load_skill_frequency(assets_dir) {
            Ok(table) => {
                info!(roles = table.roles(), "skill frequency table loaded");
                Some(table)
            }
            Err(err) => {
                warn!(error = %err, "skill frequency table unavailable");
                None
            }
        };

        let matcher = match load_candidate_matcher(assets_dir) {
            Ok(matcher) => {
                info!(candidates = matcher.corpus_len(), "candidate index loaded");
                Some(matcher)
            }
            Err(err) => {
                warn!(error = %err, "candidate index unavailable");
                None
            }
        };

        Self {
            predictor,
            skill_freq,
            matcher,
        }
    }
}
