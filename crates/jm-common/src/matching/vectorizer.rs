use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Word tokens of two or more characters, the token pattern the corpus
/// vectorizer was fit with. Changing this desynchronizes queries from the
/// precomputed candidate matrix.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// One row of a sparse term-weight matrix: parallel index/value arrays,
/// indices strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseRow {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Dot product via a merge walk over the sorted index arrays.
    pub fn dot(&self, other: &SparseRow) -> f64 {
        let mut total = 0.0;
        let mut i = 0;
        let mut j = 0;

        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    total += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }

        total
    }

    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }
}

/// Fitted TF-IDF vectorizer: term → column index plus the per-term inverse
/// document frequencies learned on the candidate corpus. Queries are embedded
/// into the same space; out-of-vocabulary terms contribute zero weight.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Embed free text as an L2-normalized sparse tf-idf row. An empty query
    /// (or one made entirely of unknown terms) embeds as the zero vector.
    pub fn transform(&self, text: &str) -> SparseRow {
        let lower = text.to_lowercase();

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in TOKEN_PATTERN.find_iter(&lower) {
            if let Some(&index) = self.vocabulary.get(token.as_str()) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .filter_map(|(index, tf)| self.idf.get(index).map(|idf| (index, tf * idf)))
            .collect();
        entries.sort_unstable_by_key(|(index, _)| *index);

        let mut row = SparseRow {
            indices: entries.iter().map(|(index, _)| *index).collect(),
            values: entries.into_iter().map(|(_, weight)| weight).collect(),
        };

        let norm = row.norm();
        if norm > 0.0 {
            for value in &mut row.values {
                *value /= norm;
            }
        }

        row
    }
}
