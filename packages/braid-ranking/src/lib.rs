pub mod blend;
pub mod bm25;
pub mod lexical;
pub mod normalize;
pub mod text;
pub mod tfidf;

use std::cmp::Ordering;

pub use blend::{Blended, LexicalSignal, blend};
pub use bm25::{Bm25Index, Bm25Params};
pub use lexical::{DEFAULT_CANDIDATE_FLOOR, LexicalRanker, ScoredCandidate};
pub use tfidf::{SparseVector, TfidfMatrix, TfidfVectorizer};

/// Descending float order with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
