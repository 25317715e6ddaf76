use std::collections::HashMap;

use thiserror::Error;

use super::{CategoricalEncoder, FeatureSchema, GradientBoostedModel, SkillEncoder};
use crate::PredictionInput;
use crate::normalize::normalize_location;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model references feature index {index} outside the {width}-column schema")]
    FeatureOutOfRange { index: usize, width: usize },
    #[error("model produced a non-finite prediction")]
    NonFinite,
}

/// End-to-end salary inference pipeline over frozen artifacts: categorical
/// encoding, multi-hot skills, schema reindexing, tree-ensemble evaluation,
/// and inverse target transform.
#[derive(Debug, Clone)]
pub struct SalaryPredictor {
    pub encoder: CategoricalEncoder,
    pub skills: SkillEncoder,
    pub schema: FeatureSchema,
    pub model: GradientBoostedModel,
}

impl SalaryPredictor {
    /// Predict a salary (currency units, e.g. LPA) for raw request data.
    /// Unseen roles/locations/skills degrade to defaults; a malformed
    /// experience value is treated as zero; any internal inconsistency comes
    /// back as a typed error, never a partial numeric result.
    pub fn predict(&self, input: &PredictionInput) -> Result<f64, PredictError> {
        let location = normalize_location(Some(&input.location));
        let (role_enc, loc_enc) = self.encoder.encode(&input.role, &location);

        let experience = if input.experience_years.is_finite() && input.experience_years >= 0.0 {
            input.experience_years
        } else {
            0.0
        };

        let mut row: HashMap<String, f64> = HashMap::with_capacity(3 + self.skills.len());
        let [role_col, loc_col] = self.encoder.output_columns();
        row.insert(role_col.to_string(), role_enc);
        row.insert(loc_col.to_string(), loc_enc);
        row.insert("experience_years".to_string(), experience);

        let skill_row = self.skills.transform(&input.skills);
        for (column, value) in self.skills.column_names().zip(skill_row) {
            row.insert(column, value);
        }

        let diff = self.schema.diff(&row);
        if !diff.is_aligned() {
            tracing::debug!(
                missing = diff.missing.len(),
                extra = diff.extra.len(),
                "feature row reindexed to training schema"
            );
        }
        let features = self.schema.reindex(&row);

        let raw = self
            .model
            .predict(&features)
            .ok_or(PredictError::FeatureOutOfRange {
                index: self.model.max_feature_index().unwrap_or(0),
                width: features.len(),
            })?;

        let value = if self.model.log_target {
            raw.exp_m1()
        } else {
            raw
        };

        if !value.is_finite() {
            return Err(PredictError::NonFinite);
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::encoder::LabelEncoder;
    use crate::features::model::{Tree, TreeNode};

    fn label(classes: &[&str]) -> LabelEncoder {
        LabelEncoder {
            classes: classes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn leaf_only_model(value: f64, log_target: bool) -> GradientBoostedModel {
        GradientBoostedModel {
            base_score: 0.0,
            log_target,
            trees: vec![Tree {
                nodes: vec![TreeNode::Leaf { value }],
            }],
        }
    }

    fn predictor(log_target: bool) -> SalaryPredictor {
        let skills = SkillEncoder::new(vec![
            "Machine Learning".to_string(),
            "Python".to_string(),
        ]);
        let schema = FeatureSchema::new(vec![
            "Role_Enc".to_string(),
            "Loc_Enc".to_string(),
            "experience_years".to_string(),
            "Skill_Machine Learning".to_string(),
            "Skill_Python".to_string(),
        ]);

        SalaryPredictor {
            encoder: CategoricalEncoder::Label {
                role: label(&["Data Analyst", "Data Scientist"]),
                location: label(&["Remote", "Bangalore, India"]),
            },
            skills,
            schema,
            model: leaf_only_model(12.5, log_target),
        }
    }

    #[test]
    fn predicts_for_unseen_role_and_location_without_error() {
        let input = PredictionInput {
            role: "Underwater Basket Weaver".to_string(),
            location: "Atlantis".to_string(),
            experience_years: 5.0,
            skills: vec!["Python".to_string(), "Machine Learning".to_string()],
        };

        let value = predictor(false).predict(&input).unwrap();

        assert!(value > 0.0);
        assert_eq!(value, 12.5);
    }

    #[test]
    fn inverts_log_transform_when_model_was_fit_on_log_target() {
        let input = PredictionInput {
            role: "Data Scientist".to_string(),
            location: "Bangalore".to_string(),
            experience_years: 5.0,
            skills: vec![],
        };

        let value = predictor(true).predict(&input).unwrap();

        assert!((value - 12.5f64.exp_m1()).abs() < 1e-9);
    }

    #[test]
    fn malformed_experience_is_treated_as_zero() {
        let mut input = PredictionInput {
            role: "Data Scientist".to_string(),
            location: "Remote".to_string(),
            experience_years: f64::NAN,
            skills: vec![],
        };

        assert!(predictor(false).predict(&input).is_ok());

        input.experience_years = -3.0;
        assert!(predictor(false).predict(&input).is_ok());
    }

    #[test]
    fn model_schema_mismatch_surfaces_as_typed_error() {
        let mut p = predictor(false);
        p.model = GradientBoostedModel {
            base_score: 0.0,
            log_target: false,
            trees: vec![Tree {
                nodes: vec![TreeNode::Split {
                    feature: 99,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                }],
            }],
        };

        let err = p
            .predict(&PredictionInput::default())
            .expect_err("out-of-range feature must fail");

        assert!(matches!(err, PredictError::FeatureOutOfRange { .. }));
    }
}
