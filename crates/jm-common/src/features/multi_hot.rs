use std::collections::HashMap;

use serde::Deserialize;

/// Multi-hot skill encoder over the fit vocabulary. Skills outside the
/// taxonomy contribute no signal: they are dropped silently, never an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "SkillEncoderData")]
pub struct SkillEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct SkillEncoderData {
    classes: Vec<String>,
}

impl From<SkillEncoderData> for SkillEncoder {
    fn from(data: SkillEncoderData) -> Self {
        SkillEncoder::new(data.classes)
    }
}

impl SkillEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, class)| (class.clone(), i))
            .collect();
        Self { classes, index }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Feature-schema column name for each known skill.
    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.classes.iter().map(|class| format!("Skill_{class}"))
    }

    /// Encode a skill list as a boolean-valued vector over the vocabulary.
    pub fn transform(&self, skills: &[String]) -> Vec<f64> {
        let mut row = vec![0.0; self.classes.len()];
        for skill in skills {
            if let Some(&i) = self.index.get(skill.as_str()) {
                row[i] = 1.0;
            }
        }
        row
    }

    /// Recover the set of skills flagged in an encoded row.
    pub fn decode(&self, row: &[f64]) -> Vec<String> {
        row.iter()
            .zip(&self.classes)
            .filter(|(value, _)| **value > 0.5)
            .map(|(_, class)| class.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> SkillEncoder {
        SkillEncoder::new(vec![
            "Docker".to_string(),
            "Python".to_string(),
            "SQL".to_string(),
        ])
    }

    #[test]
    fn unknown_skills_are_dropped_silently() {
        let row = encoder().transform(&["Python".to_string(), "Basket Weaving".to_string()]);

        assert_eq!(row, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn encode_decode_recovers_known_subset() {
        let enc = encoder();
        let input = vec![
            "SQL".to_string(),
            "Fortran".to_string(),
            "Docker".to_string(),
        ];

        let decoded = enc.decode(&enc.transform(&input));

        assert_eq!(decoded, vec!["Docker".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn duplicate_skills_encode_once() {
        let row = encoder().transform(&["SQL".to_string(), "SQL".to_string()]);

        assert_eq!(row.iter().sum::<f64>(), 1.0);
    }
}
