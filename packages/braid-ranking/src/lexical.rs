use std::collections::HashSet;

use braid_chunking::Chunk;

use crate::{
	bm25::{Bm25Index, Bm25Params},
	cmp_f32_desc, normalize, text,
	tfidf::TfidfMatrix,
};

pub const DEFAULT_CANDIDATE_FLOOR: usize = 10;
/// Share of BM25 in the lexical score; TF-IDF gets the rest.
pub const BM25_SHARE: f32 = 0.5;

/// One signal's opinion about one chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredCandidate {
	pub chunk_index: usize,
	pub raw_score: f32,
}

/// BM25 and TF-IDF over a fixed chunk corpus, blended into one lexical ranking.
///
/// The ranker is an immutable snapshot: rebuild it when the corpus changes.
#[derive(Clone, Debug)]
pub struct LexicalRanker {
	chunk_indices: Vec<usize>,
	bm25: Bm25Index,
	tfidf: TfidfMatrix,
	candidate_floor: usize,
}
impl LexicalRanker {
	pub fn new(chunks: &[Chunk], params: Bm25Params, candidate_floor: usize) -> Self {
		let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
		let tokenized: Vec<Vec<String>> = texts.iter().map(|text| text::tokenize(text)).collect();

		Self {
			chunk_indices: chunks.iter().map(|chunk| chunk.index).collect(),
			bm25: Bm25Index::new(&tokenized, params),
			tfidf: TfidfMatrix::new(&texts),
			candidate_floor: candidate_floor.max(1),
		}
	}

	pub fn len(&self) -> usize {
		self.chunk_indices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunk_indices.is_empty()
	}

	pub fn candidate_floor(&self) -> usize {
		self.candidate_floor
	}

	/// Raw BM25 score per corpus position.
	pub fn bm25_scores(&self, query: &str) -> Vec<f32> {
		self.bm25.scores(&text::tokenize(query))
	}

	/// TF-IDF cosine similarity per corpus position.
	pub fn tfidf_scores(&self, query: &str) -> Vec<f32> {
		self.tfidf.similarities(query)
	}

	/// Returns up to `limit` chunks, best first.
	///
	/// Candidates are the union of the top `max(limit, candidate_floor)` chunks by each signal;
	/// their score is the even blend of both min-max normalized signals. Ties go to the lower
	/// chunk index.
	pub fn rank(&self, query: &str, limit: usize) -> Vec<ScoredCandidate> {
		if self.is_empty() || query.trim().is_empty() {
			return Vec::new();
		}

		let bm25 = normalize::min_max(&self.bm25_scores(query));
		let tfidf = normalize::min_max(&self.tfidf_scores(query));
		let pool = limit.max(self.candidate_floor);
		let mut seen = HashSet::new();
		let mut candidates = Vec::new();

		for position in top_positions(&bm25, pool).into_iter().chain(top_positions(&tfidf, pool)) {
			if !seen.insert(position) {
				continue;
			}

			candidates.push(ScoredCandidate {
				chunk_index: self.chunk_indices[position],
				raw_score: BM25_SHARE * bm25[position] + (1.0 - BM25_SHARE) * tfidf[position],
			});
		}

		candidates.sort_by(|left, right| {
			cmp_f32_desc(left.raw_score, right.raw_score)
				.then_with(|| left.chunk_index.cmp(&right.chunk_index))
		});
		candidates.truncate(limit);

		candidates
	}
}

fn top_positions(scores: &[f32], n: usize) -> Vec<usize> {
	let mut positions: Vec<usize> = (0..scores.len()).collect();

	positions.sort_by(|left, right| {
		cmp_f32_desc(scores[*left], scores[*right]).then_with(|| left.cmp(right))
	});
	positions.truncate(n);

	positions
}

#[cfg(test)]
mod tests {
	use super::*;

	fn corpus(texts: &[&str]) -> Vec<Chunk> {
		texts
			.iter()
			.enumerate()
			.map(|(index, text)| Chunk {
				index,
				start_offset: index * 10,
				end_offset: index * 10 + text.chars().count(),
				text: text.to_string(),
			})
			.collect()
	}

	fn ranker(texts: &[&str]) -> LexicalRanker {
		LexicalRanker::new(&corpus(texts), Bm25Params::default(), DEFAULT_CANDIDATE_FLOOR)
	}

	#[test]
	fn ranks_matching_chunks_first() {
		let ranker = ranker(&["cat dog", "dog fish", "bird"]);
		let ranked = ranker.rank("dog", 5);
		let mut matching: Vec<usize> =
			ranked[..2].iter().map(|candidate| candidate.chunk_index).collect();

		matching.sort_unstable();

		assert_eq!(ranked.len(), 3);
		assert_eq!(matching, vec![0, 1]);
		assert_eq!(ranked[2].chunk_index, 2);
		assert!(ranked[1].raw_score > ranked[2].raw_score);
	}

	#[test]
	fn both_signals_agree_on_scenario() {
		let ranker = ranker(&["cat dog", "dog fish", "bird"]);

		for scores in [ranker.bm25_scores("dog"), ranker.tfidf_scores("dog")] {
			assert!(scores[0] > scores[2]);
			assert!(scores[1] > scores[2]);
		}
	}

	#[test]
	fn blank_query_or_empty_corpus_is_empty() {
		assert!(ranker(&["alpha beta"]).rank("   ", 5).is_empty());
		assert!(ranker(&[]).rank("alpha", 5).is_empty());
	}

	#[test]
	fn length_is_capped_by_limit() {
		let texts: Vec<String> = (0..30).map(|i| format!("shared term{i} filler")).collect();
		let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
		let ranker = ranker(&refs);

		assert_eq!(ranker.rank("shared", 3).len(), 3);
		assert_eq!(ranker.rank("shared", 8).len(), 8);
		assert_eq!(ranker.rank("shared", 25).len(), 25);
		assert_eq!(ranker.rank("shared", 100).len(), 30);
		assert!(ranker.rank("shared", 0).is_empty());
	}

	#[test]
	fn default_floor_does_not_lengthen_output() {
		let texts: Vec<String> = (0..12).map(|i| format!("shared word{i}")).collect();
		let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
		let ranked = ranker(&refs).rank("shared word3", 8);

		assert_eq!(ranked.len(), 8);
		assert_eq!(ranked[0].chunk_index, 3);
	}

	#[test]
	fn ties_break_by_chunk_index() {
		let ranker = ranker(&["same words", "same words", "same words"]);
		let order: Vec<usize> =
			ranker.rank("same", 3).iter().map(|candidate| candidate.chunk_index).collect();

		assert_eq!(order, vec![0, 1, 2]);
	}

	#[test]
	fn reports_assigned_chunk_indices() {
		let chunks: Vec<Chunk> = corpus(&["lion mane", "zebra herd", "lion pride"])
			.into_iter()
			.map(|chunk| Chunk { index: chunk.index + 5, ..chunk })
			.collect();
		let ranker = LexicalRanker::new(&chunks, Bm25Params::default(), 1);
		let top = ranker.rank("zebra", 1);

		assert_eq!(top.len(), 1);
		assert_eq!(top[0].chunk_index, 6);
	}
}
