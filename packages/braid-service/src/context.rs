use std::collections::{BTreeMap, HashSet};

use regex::Regex;

use crate::BlendedResult;
use braid_config::ModelPrice;

const CITATION_PATTERN: &str = r"\[\d+\]|\bhttps?://\S+";
const WORD_PATTERN: &str = r"\w+";
const COVERAGE_WORD_PATTERN: &str = r"[a-z]{3,}";

/// Renders results as `"[i] text"` blocks separated by blank lines.
///
/// This is the context handed to an answer generator, which is expected to cite the labels.
pub fn format_context(results: &[BlendedResult]) -> String {
	let mut context = String::new();

	for result in results {
		context.push_str(&format!("{} {}\n\n", result.citation, result.text));
	}

	context
}

/// Counts `[n]` labels and http(s) URLs.
pub fn citation_count(text: &str) -> usize {
	count_matches(CITATION_PATTERN, text)
}

/// Counts word-character runs.
pub fn answer_length(text: &str) -> usize {
	count_matches(WORD_PATTERN, text)
}

/// Jaccard overlap of the lowercase words of three or more ASCII letters.
///
/// 0.0 when either side has no such word.
pub fn grounding_coverage(answer: &str, context: &str) -> f32 {
	let answer = coverage_words(answer);
	let context = coverage_words(context);

	if answer.is_empty() || context.is_empty() {
		return 0.0;
	}

	let shared = answer.intersection(&context).count();
	let union = answer.union(&context).count();

	shared as f32 / union as f32
}

/// Rough token count at four characters per token, never below one.
pub fn token_estimate(text: &str) -> usize {
	(text.chars().count() / 4).max(1)
}

/// Estimated USD cost of one generation call.
///
/// Prices are per thousand tokens. A model missing from `pricing` costs nothing on that side.
pub fn cost_estimate(
	pricing: &BTreeMap<String, ModelPrice>,
	input_model: &str,
	output_model: &str,
	input_tokens: usize,
	output_tokens: usize,
) -> f64 {
	let input = pricing.get(input_model).map(|price| price.input).unwrap_or(0.0);
	let output = pricing.get(output_model).map(|price| price.output).unwrap_or(0.0);

	input_tokens as f64 / 1_000.0 * input + output_tokens as f64 / 1_000.0 * output
}

fn count_matches(pattern: &str, text: &str) -> usize {
	Regex::new(pattern).map(|re| re.find_iter(text).count()).unwrap_or(0)
}

fn coverage_words(text: &str) -> HashSet<String> {
	let lowered = text.to_lowercase();

	Regex::new(COVERAGE_WORD_PATTERN)
		.map(|re| re.find_iter(&lowered).map(|word| word.as_str().to_string()).collect())
		.unwrap_or_default()
}
