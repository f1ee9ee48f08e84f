use std::{collections::HashMap, hash::Hash};

/// Spreads below this are treated as all-equal.
pub const DEGENERATE_SPREAD: f32 = 1e-9;

/// Min-max scales `scores` into `[0, 1]`.
///
/// Non-finite inputs count as 0.0. When every value is (nearly) equal the result is all
/// zeros, so a flat signal contributes nothing to a blend.
pub fn min_max(scores: &[f32]) -> Vec<f32> {
	let finite: Vec<f32> =
		scores.iter().map(|score| if score.is_finite() { *score } else { 0.0 }).collect();
	let Some(lo) = finite.iter().copied().reduce(f32::min) else { return Vec::new() };
	let hi = finite.iter().copied().fold(lo, f32::max);
	let spread = hi - lo;

	if spread < DEGENERATE_SPREAD {
		return vec![0.0; finite.len()];
	}

	finite.into_iter().map(|score| ((score - lo) / spread).clamp(0.0, 1.0)).collect()
}

/// Min-max scales keyed scores. A key seen twice keeps its first score.
pub fn min_max_by_key<K>(scores: impl IntoIterator<Item = (K, f32)>) -> HashMap<K, f32>
where
	K: Eq + Hash,
{
	let mut raw = Vec::new();
	let mut seen = HashMap::new();

	for (key, score) in scores {
		if seen.contains_key(&key) {
			continue;
		}

		seen.insert(key, raw.len());
		raw.push(score);
	}

	let normalized = min_max(&raw);

	seen.into_iter().map(|(key, position)| (key, normalized[position])).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scales_into_unit_range() {
		assert_eq!(min_max(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
	}

	#[test]
	fn equal_scores_normalize_to_zero() {
		let normalized = min_max_by_key([("a", 5.0), ("b", 5.0), ("c", 5.0)]);

		assert_eq!(normalized.len(), 3);

		for value in normalized.values() {
			assert_eq!(*value, 0.0);
		}
	}

	#[test]
	fn non_finite_scores_never_leak() {
		let normalized = min_max(&[f32::NAN, 1.0, f32::INFINITY, 2.0]);

		assert!(normalized.iter().all(|value| value.is_finite()));
		assert_eq!(normalized, vec![0.0, 0.5, 0.0, 1.0]);
	}

	#[test]
	fn empty_input_stays_empty() {
		assert!(min_max(&[]).is_empty());
		assert!(min_max_by_key(Vec::<(u8, f32)>::new()).is_empty());
	}

	#[test]
	fn first_score_wins_for_repeated_keys() {
		let normalized = min_max_by_key([("a", 1.0), ("b", 3.0), ("a", 9.0)]);

		assert_eq!(normalized["a"], 0.0);
		assert_eq!(normalized["b"], 1.0);
	}
}
