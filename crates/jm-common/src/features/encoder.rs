use std::collections::HashMap;

use serde::Deserialize;

/// Label-index encoding fit at training time: category → position in the fit
/// class list. `encode` makes absence explicit instead of hiding it in a
/// lookup failure; callers decide what the default means.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

/// Index assigned to categories the encoder never saw at fit time.
pub const UNSEEN_CATEGORY_INDEX: usize = 0;

impl LabelEncoder {
    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|class| class == value)
    }

    /// Unseen categories map to `UNSEEN_CATEGORY_INDEX` deterministically.
    pub fn encode_or_default(&self, value: &str) -> usize {
        self.encode(value).unwrap_or(UNSEEN_CATEGORY_INDEX)
    }
}

/// Target/mean encoding fit at training time: category → learned numeric
/// representation, with the fit-time global prior for unseen categories.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetEncoder {
    pub mapping: HashMap<String, f64>,
    pub prior: f64,
}

impl TargetEncoder {
    pub fn encode(&self, value: &str) -> Option<f64> {
        self.mapping.get(value).copied()
    }

    pub fn encode_or_default(&self, value: &str) -> f64 {
        self.encode(value).unwrap_or(self.prior)
    }
}

/// The two interchangeable categorical strategies seen across training
/// variants. The artifact's `kind` tag selects which one is in play; both
/// expose the same (role, location) → two-column interface.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoricalEncoder {
    Label {
        role: LabelEncoder,
        location: LabelEncoder,
    },
    Target {
        role: TargetEncoder,
        location: TargetEncoder,
    },
}

impl CategoricalEncoder {
    /// Column names the encoder's two outputs carry in the feature schema.
    /// These differ between training variants and must match the persisted
    /// feature-column list byte for byte.
    pub fn output_columns(&self) -> [&'static str; 2] {
        match self {
            CategoricalEncoder::Label { .. } => ["Role_Enc", "Loc_Enc"],
            CategoricalEncoder::Target { .. } => ["role", "Normalized_Location"],
        }
    }

    /// Encode a (role, normalized-location) pair. Never fails: unseen
    /// categories take the strategy's documented default.
    pub fn encode(&self, role: &str, location: &str) -> (f64, f64) {
        match self {
            CategoricalEncoder::Label {
                role: role_enc,
                location: loc_enc,
            } => (
                role_enc.encode_or_default(role) as f64,
                loc_enc.encode_or_default(location) as f64,
            ),
            CategoricalEncoder::Target {
                role: role_enc,
                location: loc_enc,
            } => (
                role_enc.encode_or_default(role),
                loc_enc.encode_or_default(location),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(classes: &[&str]) -> LabelEncoder {
        LabelEncoder {
            classes: classes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn label_encoder_returns_position_or_default() {
        let enc = label(&["Data Analyst", "Data Scientist"]);

        assert_eq!(enc.encode("Data Scientist"), Some(1));
        assert_eq!(enc.encode("Quant"), None);
        assert_eq!(enc.encode_or_default("Quant"), UNSEEN_CATEGORY_INDEX);
    }

    #[test]
    fn target_encoder_falls_back_to_prior() {
        let enc = TargetEncoder {
            mapping: HashMap::from([("Remote".to_string(), 2.1)]),
            prior: 1.4,
        };

        assert_eq!(enc.encode_or_default("Remote"), 2.1);
        assert_eq!(enc.encode_or_default("Atlantis"), 1.4);
    }

    #[test]
    fn strategies_report_their_training_column_names() {
        let label_enc = CategoricalEncoder::Label {
            role: label(&["a"]),
            location: label(&["b"]),
        };
        let target_enc = CategoricalEncoder::Target {
            role: TargetEncoder {
                mapping: HashMap::new(),
                prior: 0.0,
            },
            location: TargetEncoder {
                mapping: HashMap::new(),
                prior: 0.0,
            },
        };

        assert_eq!(label_enc.output_columns(), ["Role_Enc", "Loc_Enc"]);
        assert_eq!(
            target_enc.output_columns(),
            ["role", "Normalized_Location"]
        );
    }

    #[test]
    fn encoder_artifact_parses_from_tagged_json() {
        let json = r#"{
            "kind": "target",
            "role": { "mapping": { "Data Scientist": 2.7 }, "prior": 2.0 },
            "location": { "mapping": { "Remote": 2.2 }, "prior": 2.0 }
        }"#;

        let enc: CategoricalEncoder = serde_json::from_str(json).unwrap();

        assert_eq!(enc.encode("Data Scientist", "Remote"), (2.7, 2.2));
        assert_eq!(enc.encode("Unknown", "Nowhere"), (2.0, 2.0));
    }
}
