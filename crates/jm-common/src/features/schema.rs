use std::collections::HashMap;

use serde::Deserialize;

/// The frozen training-time feature schema: an ordered list of named numeric
/// columns. Every inference row must be reindexed to exactly this set and
/// order before it reaches the model — numeric misalignment here silently
/// corrupts predictions.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

/// Explicit difference between an assembled row and the schema, computed
/// before reindexing so the adjustment is observable rather than implicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiff {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

impl SchemaDiff {
    pub fn is_aligned(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns the schema expects but the row lacks, and columns the row
    /// carries that the schema will drop.
    pub fn diff(&self, row: &HashMap<String, f64>) -> SchemaDiff {
        let missing = self
            .columns
            .iter()
            .filter(|col| !row.contains_key(*col))
            .cloned()
            .collect();
        let extra = {
            let mut extra: Vec<String> = row
                .keys()
                .filter(|key| !self.columns.contains(key))
                .cloned()
                .collect();
            extra.sort_unstable();
            extra
        };

        SchemaDiff { missing, extra }
    }

    /// Produce the model-ready vector: schema order exactly, missing columns
    /// filled with zero, extra columns dropped. Idempotent for rows already
    /// aligned with the schema.
    pub fn reindex(&self, row: &HashMap<String, f64>) -> Vec<f64> {
        self.columns
            .iter()
            .map(|col| row.get(col).copied().unwrap_or(0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            "Role_Enc".to_string(),
            "experience_years".to_string(),
            "Skill_Python".to_string(),
        ])
    }

    #[test]
    fn reindex_fills_missing_and_drops_extra() {
        let row = HashMap::from([
            ("experience_years".to_string(), 5.0),
            ("Skill_COBOL".to_string(), 1.0),
        ]);

        let diff = schema().diff(&row);
        assert_eq!(
            diff.missing,
            vec!["Role_Enc".to_string(), "Skill_Python".to_string()]
        );
        assert_eq!(diff.extra, vec!["Skill_COBOL".to_string()]);

        assert_eq!(schema().reindex(&row), vec![0.0, 5.0, 0.0]);
    }

    #[test]
    fn reindex_is_idempotent_on_aligned_rows() {
        let schema = schema();
        let row = HashMap::from([
            ("Role_Enc".to_string(), 2.0),
            ("experience_years".to_string(), 3.0),
            ("Skill_Python".to_string(), 1.0),
        ]);

        let first = schema.reindex(&row);
        let realigned: HashMap<String, f64> = schema
            .columns()
            .iter()
            .cloned()
            .zip(first.iter().copied())
            .collect();

        assert!(schema.diff(&realigned).is_aligned());
        assert_eq!(schema.reindex(&realigned), first);
    }
}
