use std::collections::{BTreeSet, HashMap};

use crate::text;

/// Feature index and weight pairs sorted by index, L2-normalized.
pub type SparseVector = Vec<(usize, f32)>;

/// Unigram and bigram TF-IDF weighting with smoothed idf.
#[derive(Clone, Debug, Default)]
pub struct TfidfVectorizer {
	vocabulary: HashMap<String, usize>,
	idf: Vec<f32>,
}
impl TfidfVectorizer {
	pub fn fit<S>(texts: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		let analyzed: Vec<Vec<String>> =
			texts.iter().map(|text| text::terms_with_bigrams(text.as_ref())).collect();

		Self::fit_analyzed(&analyzed)
	}

	fn fit_analyzed(analyzed: &[Vec<String>]) -> Self {
		let terms: BTreeSet<&str> =
			analyzed.iter().flat_map(|doc| doc.iter().map(String::as_str)).collect();
		let vocabulary: HashMap<String, usize> =
			terms.into_iter().enumerate().map(|(idx, term)| (term.to_string(), idx)).collect();
		let mut doc_freqs = vec![0_u32; vocabulary.len()];

		for doc in analyzed {
			let unique: BTreeSet<usize> =
				doc.iter().filter_map(|term| vocabulary.get(term).copied()).collect();

			for feature in unique {
				doc_freqs[feature] += 1;
			}
		}

		let n = analyzed.len() as f32;
		let idf = doc_freqs.iter().map(|df| ((1.0 + n) / (1.0 + *df as f32)).ln() + 1.0).collect();

		Self { vocabulary, idf }
	}

	pub fn vocabulary_len(&self) -> usize {
		self.vocabulary.len()
	}

	/// Projects `text` into the fitted space. Unknown terms are ignored.
	pub fn transform(&self, text: &str) -> SparseVector {
		self.weigh(&text::terms_with_bigrams(text))
	}

	fn weigh(&self, terms: &[String]) -> SparseVector {
		let mut counts: HashMap<usize, f32> = HashMap::new();

		for term in terms {
			if let Some(feature) = self.vocabulary.get(term) {
				*counts.entry(*feature).or_insert(0.0) += 1.0;
			}
		}

		let mut vector: SparseVector =
			counts.into_iter().map(|(feature, tf)| (feature, tf * self.idf[feature])).collect();

		vector.sort_by_key(|(feature, _)| *feature);
		l2_normalize(&mut vector);

		vector
	}
}

/// A fitted vectorizer plus one row per document.
#[derive(Clone, Debug, Default)]
pub struct TfidfMatrix {
	vectorizer: TfidfVectorizer,
	rows: Vec<SparseVector>,
}
impl TfidfMatrix {
	pub fn new<S>(texts: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		let analyzed: Vec<Vec<String>> =
			texts.iter().map(|text| text::terms_with_bigrams(text.as_ref())).collect();
		let vectorizer = TfidfVectorizer::fit_analyzed(&analyzed);
		let rows = analyzed.iter().map(|terms| vectorizer.weigh(terms)).collect();

		Self { vectorizer, rows }
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn vectorizer(&self) -> &TfidfVectorizer {
		&self.vectorizer
	}

	/// Cosine similarity between `query` and every row, in row order.
	pub fn similarities(&self, query: &str) -> Vec<f32> {
		let query = self.vectorizer.transform(query);

		self.rows.iter().map(|row| cosine(&query, row)).collect()
	}
}

/// Cosine similarity of two sorted, L2-normalized sparse vectors.
pub fn cosine(left: &SparseVector, right: &SparseVector) -> f32 {
	let mut dot = 0.0_f32;
	let (mut i, mut j) = (0_usize, 0_usize);

	while i < left.len() && j < right.len() {
		match left[i].0.cmp(&right[j].0) {
			std::cmp::Ordering::Less => i += 1,
			std::cmp::Ordering::Greater => j += 1,
			std::cmp::Ordering::Equal => {
				dot += left[i].1 * right[j].1;
				i += 1;
				j += 1;
			},
		}
	}

	dot.clamp(0.0, 1.0)
}

fn l2_normalize(vector: &mut SparseVector) {
	let mut squares: Vec<f32> = vector.iter().map(|(_, weight)| weight * weight).collect();

	// Value order keeps the norm identical for rows holding the same weights.
	squares.sort_by(f32::total_cmp);

	let norm = squares.iter().sum::<f32>().sqrt();

	if norm <= 0.0 || !norm.is_finite() {
		vector.clear();

		return;
	}

	for (_, weight) in vector.iter_mut() {
		*weight /= norm;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rows_are_unit_length() {
		let matrix = TfidfMatrix::new(&["cat dog", "dog fish", "bird"]);

		for row in &matrix.rows {
			let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();

			assert!((norm - 1.0).abs() < 1e-5);
		}
	}

	#[test]
	fn matching_rows_score_above_others() {
		let matrix = TfidfMatrix::new(&["cat dog", "dog fish", "bird"]);
		let sims = matrix.similarities("dog");

		assert!(sims[0] > 0.0);
		assert_eq!(sims[0], sims[1]);
		assert_eq!(sims[2], 0.0);
	}

	#[test]
	fn bigrams_reward_phrase_order() {
		let matrix = TfidfMatrix::new(&["new york city", "york new city"]);
		let sims = matrix.similarities("new york");

		assert!(sims[0] > sims[1]);
	}

	#[test]
	fn identical_text_has_unit_similarity() {
		let matrix = TfidfMatrix::new(&["alpha beta gamma", "delta"]);
		let sims = matrix.similarities("alpha beta gamma");

		assert!((sims[0] - 1.0).abs() < 1e-5);
	}

	#[test]
	fn unknown_query_terms_give_zero() {
		let matrix = TfidfMatrix::new(&["alpha beta"]);

		assert_eq!(matrix.similarities("zeta"), vec![0.0]);
		assert!(TfidfMatrix::new::<&str>(&[]).similarities("alpha").is_empty());
	}
}
