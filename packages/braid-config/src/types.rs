use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub ingest: Ingest,
	/// USD per thousand tokens, keyed by model name.
	#[serde(default = "default_pricing")]
	pub pricing: BTreeMap<String, ModelPrice>,
	/// Present only when the hosted vector backend should be used.
	pub hosted: Option<Hosted>,
}
impl Default for Config {
	fn default() -> Self {
		Self {
			service: Service::default(),
			chunking: Chunking::default(),
			retrieval: Retrieval::default(),
			ingest: Ingest::default(),
			pricing: default_pricing(),
			hosted: None,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub chunk_size: u32,
	pub overlap: u32,
}
impl Default for Chunking {
	fn default() -> Self {
		Self { chunk_size: 900, overlap: 120 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	/// 0.0 keeps the lexical order, 1.0 keeps the vector order.
	pub vector_weight: f32,
	/// Minimum number of candidates requested from each side before blending.
	pub candidate_floor: u32,
	/// Minimum candidate pool drawn from each lexical signal inside the lexical ranker.
	pub lexical_candidate_floor: u32,
	/// How the lexical side enters the final blend: "rank" or "score".
	pub lexical_signal: String,
	pub bm25: Bm25,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 6,
			vector_weight: 0.5,
			candidate_floor: 8,
			lexical_candidate_floor: 10,
			lexical_signal: "rank".to_string(),
			bm25: Bm25::default(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Bm25 {
	pub k1: f32,
	pub b: f32,
	pub epsilon: f32,
}
impl Default for Bm25 {
	fn default() -> Self {
		Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Ingest {
	/// Data rows kept from CSV documents.
	pub csv_max_rows: u32,
}
impl Default for Ingest {
	fn default() -> Self {
		Self { csv_max_rows: 1_000 }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelPrice {
	pub input: f64,
	pub output: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Hosted {
	#[serde(default)]
	pub qdrant: Qdrant,
	#[serde(default)]
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Qdrant {
	pub url: Option<String>,
	pub api_key: Option<String>,
	pub collection: String,
	pub timeout_ms: u64,
}
impl Default for Qdrant {
	fn default() -> Self {
		Self {
			url: None,
			api_key: None,
			collection: "braid_chunks".to_string(),
			timeout_ms: 30_000,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}
impl Default for EmbeddingProviderConfig {
	fn default() -> Self {
		Self {
			provider_id: "jina".to_string(),
			api_base: "https://api.jina.ai".to_string(),
			api_key: None,
			path: "/v1/embeddings".to_string(),
			model: "jina-embeddings-v3".to_string(),
			dimensions: 1_024,
			timeout_ms: 60_000,
			default_headers: Map::new(),
		}
	}
}

fn default_pricing() -> BTreeMap<String, ModelPrice> {
	BTreeMap::from([
		("openai/gpt-4o-mini".to_string(), ModelPrice { input: 0.15, output: 0.6 }),
		("openai/gpt-4o-audio-preview".to_string(), ModelPrice { input: 0.15, output: 0.6 }),
		("llama-3.1-8b-instant".to_string(), ModelPrice { input: 0.0, output: 0.0 }),
	])
}
