use super::vectorizer::SparseRow;

/// Cosine similarity between two sparse term-weight rows. The weights are
/// non-negative tf-idf values, so the result lives in [0, 1]. Either vector
/// having zero norm yields zero similarity.
pub fn cosine_similarity(a: &SparseRow, b: &SparseRow) -> f64 {
    let norm_a = a.norm();
    let norm_b = b.norm();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    a.dot(b) / (norm_a * norm_b)
}
