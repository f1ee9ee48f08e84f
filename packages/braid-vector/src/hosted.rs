use std::{collections::HashMap, sync::Arc, time::Duration};

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		CreateCollectionBuilder, Distance, PointStruct, Query, QueryPointsBuilder, ScoredPoint,
		UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
	},
};
use uuid::Uuid;

use crate::{BackendKind, BoxFuture, Error, HitMetadata, Result, VectorBackend, VectorHit};
use braid_chunking::Chunk;
use braid_config::{EmbeddingProviderConfig, Hosted};
use braid_providers::EmbeddingProvider;

/// Qdrant collection of embedded chunks, one point per chunk.
pub struct HostedBackend {
	client: Qdrant,
	collection: String,
	embedding: EmbeddingProviderConfig,
	embedder: Arc<dyn EmbeddingProvider>,
}
impl HostedBackend {
	/// Connects and makes sure the collection exists.
	///
	/// Fails before any network call when the Qdrant URL, the Qdrant API key or the
	/// embedding API key is missing.
	pub async fn connect(cfg: &Hosted, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
		let url = required(cfg.qdrant.url.as_deref(), "hosted.qdrant.url")?;
		let api_key = required(cfg.qdrant.api_key.as_deref(), "hosted.qdrant.api_key")?;

		required(cfg.embedding.api_key.as_deref(), "hosted.embedding.api_key")?;

		let client = Qdrant::from_url(url)
			.api_key(api_key)
			.timeout(Duration::from_millis(cfg.qdrant.timeout_ms))
			.build()
			.map_err(|err| Error::hosted("connect", err))?;
		let backend = Self {
			client,
			collection: cfg.qdrant.collection.clone(),
			embedding: cfg.embedding.clone(),
			embedder,
		};

		backend.ensure_collection().await?;

		Ok(backend)
	}

	pub fn collection(&self) -> &str {
		&self.collection
	}

	async fn ensure_collection(&self) -> Result<()> {
		let exists = self
			.client
			.collection_exists(self.collection.clone())
			.await
			.map_err(|err| Error::hosted("collection_exists", err))?;

		if exists {
			return Ok(());
		}

		self.create_collection().await
	}

	async fn create_collection(&self) -> Result<()> {
		let builder = CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
			VectorParamsBuilder::new(self.embedding.dimensions.into(), Distance::Cosine),
		);

		self.client
			.create_collection(builder)
			.await
			.map_err(|err| Error::hosted("create_collection", err))?;

		tracing::info!(
			collection = %self.collection,
			dimensions = self.embedding.dimensions,
			"Qdrant collection created."
		);

		Ok(())
	}

	async fn embed(&self, operation: &'static str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let vectors = self
			.embedder
			.embed(&self.embedding, texts)
			.await
			.map_err(|err| Error::hosted(operation, err))?;

		check_embeddings(&vectors, texts.len(), self.embedding.dimensions as usize)?;

		Ok(vectors)
	}

	async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
		if chunks.is_empty() {
			return Ok(());
		}

		let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
		let vectors = self.embed("embed", &texts).await?;
		let points: Vec<PointStruct> = chunks
			.iter()
			.zip(vectors)
			.map(|(chunk, vector)| {
				PointStruct::new(Uuid::new_v4().to_string(), vector, chunk_payload(chunk))
			})
			.collect();
		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await.map_err(|err| Error::hosted("upsert", err))?;

		tracing::debug!(collection = %self.collection, points = chunks.len(), "Chunks upserted.");

		Ok(())
	}

	async fn query(&self, query: &str, k: usize) -> Result<Vec<VectorHit>> {
		if k == 0 || query.trim().is_empty() {
			return Ok(Vec::new());
		}

		let mut vectors = self.embed("embed_query", &[query.to_string()]).await?;
		let Some(vector) = vectors.pop() else { return Ok(Vec::new()) };
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(k as u64)
			.with_payload(true);
		let response =
			self.client.query(search).await.map_err(|err| Error::hosted("query", err))?;
		let mut hits: Vec<VectorHit> = response.result.into_iter().map(scored_point_hit).collect();

		hits.truncate(k);

		Ok(hits)
	}
}
impl VectorBackend for HostedBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Hosted
	}

	fn clear(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			if let Err(err) = self.client.delete_collection(self.collection.clone()).await {
				tracing::debug!(
					collection = %self.collection,
					error = %err,
					"Qdrant collection delete failed; recreating anyway."
				);
			}

			self.create_collection().await
		})
	}

	fn add<'a>(&'a mut self, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.upsert(chunks))
	}

	fn search<'a>(&'a self, query: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(self.query(query, k))
	}
}

fn required<'a>(value: Option<&'a str>, label: &str) -> Result<&'a str> {
	value.ok_or_else(|| Error::Configuration {
		message: format!("{label} is required for the hosted backend."),
	})
}

fn chunk_payload(chunk: &Chunk) -> Payload {
	let mut payload = HashMap::new();

	payload.insert("text".to_string(), Value::from(chunk.text.clone()));
	payload.insert("chunk_index".to_string(), Value::from(chunk.index as i64));
	payload.insert("start_offset".to_string(), Value::from(chunk.start_offset as i64));
	payload.insert("end_offset".to_string(), Value::from(chunk.end_offset as i64));

	Payload::from(payload)
}

fn scored_point_hit(point: ScoredPoint) -> VectorHit {
	let payload = &point.payload;

	VectorHit {
		text: payload_string(payload, "text").unwrap_or_default(),
		score: point.score,
		metadata: HitMetadata {
			chunk_index: payload_usize(payload, "chunk_index"),
			start_offset: payload_usize(payload, "start_offset"),
			end_offset: payload_usize(payload, "end_offset"),
		},
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_usize(payload: &HashMap<String, Value>, key: &str) -> Option<usize> {
	match &payload.get(key)?.kind {
		Some(Kind::IntegerValue(value)) => usize::try_from(*value).ok(),
		Some(Kind::DoubleValue(value)) =>
			if value.fract() == 0.0 && *value >= 0.0 {
				Some(*value as usize)
			} else {
				None
			},
		_ => None,
	}
}

/// Rejects a provider reply with the wrong number of vectors or any vector of the wrong width.
fn check_embeddings(
	vectors: &[Vec<f32>],
	expected_count: usize,
	dimensions: usize,
) -> Result<()> {
	if vectors.len() != expected_count {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding provider returned {} vectors for {expected_count} texts.",
				vectors.len()
			),
		});
	}

	if let Some(vector) = vectors.iter().find(|vector| vector.len() != dimensions) {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding dimension mismatch: expected {dimensions}, got {}.",
				vector.len()
			),
		});
	}

	Ok(())
}
