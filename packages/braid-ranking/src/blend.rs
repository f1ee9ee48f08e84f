use std::{collections::HashSet, hash::Hash};

use crate::{cmp_f32_desc, normalize};

/// How the lexical side enters the final blend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LexicalSignal {
	/// `N - position` in the lexical ranking. Independent of BM25/TF-IDF magnitudes.
	#[default]
	Rank,
	/// The lexical ranker's own blended score.
	Score,
}
impl LexicalSignal {
	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"rank" => Some(Self::Rank),
			"score" => Some(Self::Score),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Rank => "rank",
			Self::Score => "score",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Blended<K> {
	pub key: K,
	pub score: f32,
	pub lexical: f32,
	pub vector: f32,
}

/// Merges a lexical ranking and a vector ranking into one list of at most `k` keys.
///
/// `lexical` must be in lexical rank order and `vector` in descending similarity order.
/// `weight` is the vector share: 0.0 reproduces the lexical order, 1.0 the vector order.
/// Ties keep first-seen order, lexical keys before vector-only keys.
pub fn blend<K>(
	lexical: &[(K, f32)],
	vector: &[(K, f32)],
	weight: f32,
	k: usize,
	signal: LexicalSignal,
) -> Vec<Blended<K>>
where
	K: Clone + Eq + Hash,
{
	if k == 0 {
		return Vec::new();
	}

	let weight = if weight.is_finite() { weight.clamp(0.0, 1.0) } else { 0.0 };
	let total = lexical.len();
	let lexical_norm = normalize::min_max_by_key(lexical.iter().enumerate().map(
		|(position, (key, score))| {
			let raw = match signal {
				LexicalSignal::Rank => (total - position) as f32,
				LexicalSignal::Score => *score,
			};

			(key, raw)
		},
	));
	let vector_norm =
		normalize::min_max_by_key(vector.iter().map(|(key, score)| (key, *score)));
	let mut seen = HashSet::new();
	let mut blended = Vec::new();

	for (key, _) in lexical.iter().chain(vector.iter()) {
		if !seen.insert(key) {
			continue;
		}

		let lexical_score = lexical_norm.get(key).copied().unwrap_or(0.0);
		let vector_score = vector_norm.get(key).copied().unwrap_or(0.0);

		blended.push(Blended {
			key: key.clone(),
			score: (1.0 - weight) * lexical_score + weight * vector_score,
			lexical: lexical_score,
			vector: vector_score,
		});
	}

	// Stable: equal scores keep union order.
	blended.sort_by(|left, right| cmp_f32_desc(left.score, right.score));
	blended.truncate(k);

	tracing::trace!(
		lexical = lexical.len(),
		vector = vector.len(),
		kept = blended.len(),
		weight,
		signal = signal.as_str(),
		"Candidates blended."
	);

	blended
}
