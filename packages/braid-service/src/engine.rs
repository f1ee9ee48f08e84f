use std::fmt;

use serde::Serialize;

use crate::{Error, Result};
use braid_chunking::{ChunkingConfig, Document};
use braid_config::Config;
use braid_ranking::{Bm25Params, LexicalRanker, LexicalSignal, ScoredCandidate};
use braid_vector::{VectorBackend, VectorHit};

/// Label tying a result back to the chunk it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Citation {
	Index(usize),
	/// The result text matches no chunk of the indexed document.
	Unknown,
}
impl fmt::Display for Citation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Index(index) => write!(f, "[{index}]"),
			Self::Unknown => f.write_str("[?]"),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlendedResult {
	pub citation: Citation,
	pub text: String,
	pub blended_score: f32,
	pub lexical_score: f32,
	pub vector_score: f32,
}

/// Tunables read once from [`Config`].
#[derive(Clone, Debug)]
pub struct EngineSettings {
	pub candidate_floor: usize,
	pub lexical_candidate_floor: usize,
	pub lexical_signal: LexicalSignal,
	pub bm25: Bm25Params,
}
impl EngineSettings {
	pub fn from_config(cfg: &Config) -> Self {
		let retrieval = &cfg.retrieval;

		Self {
			candidate_floor: retrieval.candidate_floor.max(1) as usize,
			lexical_candidate_floor: retrieval.lexical_candidate_floor.max(1) as usize,
			lexical_signal: LexicalSignal::parse(&retrieval.lexical_signal).unwrap_or_default(),
			bm25: Bm25Params {
				k1: retrieval.bm25.k1,
				b: retrieval.bm25.b,
				epsilon: retrieval.bm25.epsilon,
			},
		}
	}
}
impl Default for EngineSettings {
	fn default() -> Self {
		Self::from_config(&Config::default())
	}
}

/// Hybrid lexical and dense retrieval over one indexed document.
pub struct RetrievalEngine {
	settings: EngineSettings,
	backend: Box<dyn VectorBackend>,
	document: Document,
	ranker: Option<LexicalRanker>,
}
impl RetrievalEngine {
	pub fn new(cfg: &Config, backend: Box<dyn VectorBackend>) -> Self {
		Self::with_settings(EngineSettings::from_config(cfg), backend)
	}

	pub fn with_settings(settings: EngineSettings, backend: Box<dyn VectorBackend>) -> Self {
		Self { settings, backend, document: Document::default(), ranker: None }
	}

	/// Builds the engine with the backend `cfg` selects.
	pub async fn from_config(cfg: &Config) -> Result<Self> {
		let backend =
			braid_vector::build_backend(cfg).await.map_err(Error::vector("build_backend"))?;

		Ok(Self::new(cfg, backend))
	}

	pub fn settings(&self) -> &EngineSettings {
		&self.settings
	}

	pub fn backend(&self) -> &dyn VectorBackend {
		self.backend.as_ref()
	}

	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Chunks `text` and replaces everything indexed before.
	pub async fn index(&mut self, text: &str, chunk_size: usize, overlap: usize) -> Result<&Document> {
		let document = Document::new(text, &ChunkingConfig { chunk_size, overlap });

		self.index_document(document).await
	}

	/// Replaces the indexed document with an already chunked one.
	///
	/// The new document is committed only once the backend holds its chunks. A backend failure
	/// leaves the engine unindexed, so searches return nothing until the next successful index.
	pub async fn index_document(&mut self, document: Document) -> Result<&Document> {
		let ranker = LexicalRanker::new(
			document.chunks(),
			self.settings.bm25,
			self.settings.lexical_candidate_floor,
		);

		if let Err(err) = self.repopulate(&document).await {
			self.ranker = None;
			self.document = Document::default();

			tracing::warn!(error = %err, backend = %self.backend.kind(), "Indexing aborted.");

			return Err(err);
		}

		self.ranker = Some(ranker);
		self.document = document;

		tracing::info!(
			chunks = self.document.len(),
			chars = self.document.text_len(),
			backend = %self.backend.kind(),
			"Document indexed."
		);

		Ok(&self.document)
	}

	/// Returns at most `k` results, best first.
	///
	/// `weight` is the vector share of the blend: 0.0 is purely lexical, 1.0 purely dense.
	pub async fn search(&self, query: &str, k: usize, weight: f32) -> Result<Vec<BlendedResult>> {
		let Some(ranker) = self.ranker.as_ref() else { return Ok(Vec::new()) };

		if k == 0 || query.trim().is_empty() || self.document.is_empty() {
			return Ok(Vec::new());
		}

		let pool = k.max(self.settings.candidate_floor);
		let lexical = async { ranker.rank(query, pool) };
		let (lexical, vector) = tokio::join!(lexical, self.backend.search(query, pool));
		let vector = vector.map_err(Error::vector("search"))?;
		let results = self.blend(&lexical, &vector, weight, k);

		tracing::debug!(
			lexical = lexical.len(),
			vector = vector.len(),
			results = results.len(),
			k,
			weight,
			"Search completed."
		);

		Ok(results)
	}

	async fn repopulate(&mut self, document: &Document) -> Result<()> {
		self.backend.clear().await.map_err(Error::vector("index"))?;
		self.backend.add(document.chunks()).await.map_err(Error::vector("index"))?;

		Ok(())
	}

	fn blend(
		&self,
		lexical: &[ScoredCandidate],
		vector: &[VectorHit],
		weight: f32,
		k: usize,
	) -> Vec<BlendedResult> {
		let lexical_keys: Vec<(&str, f32)> = lexical
			.iter()
			.filter_map(|candidate| {
				self.document
					.get(candidate.chunk_index)
					.map(|chunk| (chunk.text.as_str(), candidate.raw_score))
			})
			.collect();
		let vector_keys: Vec<(&str, f32)> =
			vector.iter().map(|hit| (hit.text.as_str(), hit.score)).collect();

		braid_ranking::blend(&lexical_keys, &vector_keys, weight, k, self.settings.lexical_signal)
			.into_iter()
			.map(|blended| BlendedResult {
				citation: self
					.document
					.citation_for(blended.key)
					.map(Citation::Index)
					.unwrap_or(Citation::Unknown),
				text: blended.key.to_string(),
				blended_score: blended.score,
				lexical_score: blended.lexical,
				vector_score: blended.vector,
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn citations_render_as_labels() {
		assert_eq!(Citation::Index(12).to_string(), "[12]");
		assert_eq!(Citation::Unknown.to_string(), "[?]");
	}

	#[test]
	fn settings_follow_config() {
		let mut cfg = Config::default();

		cfg.retrieval.candidate_floor = 3;
		cfg.retrieval.lexical_signal = "score".to_string();

		let settings = EngineSettings::from_config(&cfg);

		assert_eq!(settings.candidate_floor, 3);
		assert_eq!(settings.lexical_candidate_floor, 10);
		assert_eq!(settings.lexical_signal, LexicalSignal::Score);
	}

	#[test]
	fn citations_serialize_by_variant() {
		let json = serde_json::to_value([Citation::Index(2), Citation::Unknown])
			.expect("Failed to serialize citations.");

		assert_eq!(json, serde_json::json!([{ "index": 2 }, "unknown"]));
	}
}
