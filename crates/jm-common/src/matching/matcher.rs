use std::cmp::Ordering;

use super::similarity::cosine_similarity;
use super::vectorizer::{SparseRow, TfidfVectorizer};
use crate::Candidate;

/// One ranked result. Score is similarity scaled to 0..100, rounded to one
/// decimal, the wire format downstream consumers expect.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub candidate: Candidate,
    pub score: f64,
}

/// Immutable candidate index: the fitted vectorizer, the precomputed
/// embedding matrix, and the metadata table it is positionally aligned with.
#[derive(Debug, Clone)]
pub struct CandidateMatcher {
    pub vectorizer: TfidfVectorizer,
    pub matrix: Vec<SparseRow>,
    pub candidates: Vec<Candidate>,
}

impl CandidateMatcher {
    pub fn corpus_len(&self) -> usize {
        self.candidates.len()
    }

    /// Rank the corpus against a skill query. Stable sort: equal scores keep
    /// corpus order. `top_n` larger than the corpus returns the whole corpus
    /// ranked; an empty or fully out-of-vocabulary query ranks everything at
    /// zero.
    pub fn match_candidates(&self, skills_required: &[String], top_n: usize) -> Vec<CandidateMatch> {
        let query = self.vectorizer.transform(&skills_required.join(" "));

        let mut scored: Vec<(usize, f64)> = self
            .matrix
            .iter()
            .map(|row| cosine_similarity(&query, row))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_n);

        scored
            .into_iter()
            .map(|(index, similarity)| CandidateMatch {
                candidate: self.candidates[index].clone(),
                score: (similarity * 1000.0).round() / 10.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn candidate(id: &str, skills: &str) -> Candidate {
        Candidate {
            candidate_id: id.to_string(),
            name: format!("Candidate {id}"),
            email: format!("{id}@example.com"),
            experience_level: "Mid-level".to_string(),
            skills: skills.to_string(),
        }
    }

    /// Five candidates over a three-term vocabulary, rows pre-normalized the
    /// way the fitted matrix artifact is.
    fn matcher() -> CandidateMatcher {
        let vectorizer = TfidfVectorizer {
            vocabulary: HashMap::from([
                ("python".to_string(), 0),
                ("sql".to_string(), 1),
                ("docker".to_string(), 2),
            ]),
            idf: vec![1.0, 1.0, 1.0],
        };

        let corpus = [
            ("CAN_1000", "Python, SQL"),
            ("CAN_1001", "Docker"),
            ("CAN_1002", "Python"),
            ("CAN_1003", "SQL, Docker"),
            ("CAN_1004", "Python, SQL, Docker"),
        ];

        let matrix = corpus
            .iter()
            .map(|(_, skills)| vectorizer.transform(skills))
            .collect();
        let candidates = corpus
            .iter()
            .map(|(id, skills)| candidate(id, skills))
            .collect();

        CandidateMatcher {
            vectorizer,
            matrix,
            candidates,
        }
    }

    #[test]
    fn returns_exactly_top_n_with_non_increasing_scores() {
        let results =
            matcher().match_candidates(&["Python".to_string(), "SQL".to_string()], 3);

        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].candidate.candidate_id, "CAN_1000");
    }

    #[test]
    fn top_n_beyond_corpus_returns_every_candidate_once() {
        let results = matcher().match_candidates(&["Docker".to_string()], 50);

        assert_eq!(results.len(), 5);
        let mut ids: Vec<&str> = results
            .iter()
            .map(|m| m.candidate.candidate_id.as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn empty_query_scores_everything_zero() {
        let results = matcher().match_candidates(&[], 5);

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|m| m.score == 0.0));
    }

    #[test]
    fn ties_keep_corpus_order() {
        // "Python" scores CAN_1000 and CAN_1003 identically at zero overlap
        // positions; verify equal-scored candidates appear in corpus order.
        let results = matcher().match_candidates(&["Haskell".to_string()], 5);

        let ids: Vec<&str> = results
            .iter()
            .map(|m| m.candidate.candidate_id.as_str())
            .collect();
        assert_eq!(ids, ["CAN_1000", "CAN_1001", "CAN_1002", "CAN_1003", "CAN_1004"]);
    }

    #[test]
    fn scores_are_percentages_with_one_decimal() {
        let results = matcher().match_candidates(&["Python".to_string()], 1);

        assert_eq!(results[0].candidate.candidate_id, "CAN_1002");
        assert_eq!(results[0].score, 100.0);
    }
}
