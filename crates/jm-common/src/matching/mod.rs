pub mod matcher;
pub mod similarity;
pub mod vectorizer;

pub use matcher::{CandidateMatch, CandidateMatcher};
pub use similarity::cosine_similarity;
pub use vectorizer::{SparseRow, TfidfVectorizer};
