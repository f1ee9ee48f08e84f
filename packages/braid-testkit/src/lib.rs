mod error;

pub use error::{Error, Result};

use std::{collections::HashSet, env, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use tokio::{runtime::Builder, time};
use uuid::Uuid;

use braid_config::{EmbeddingProviderConfig, Hosted, Qdrant as QdrantConfig};
use braid_providers::{BoxFuture, EmbeddingProvider};

/// Placeholder credential for a local Qdrant that does not check API keys.
pub const TEST_API_KEY: &str = "braid-test-key";

pub fn env_qdrant_url() -> Option<String> {
	env::var("BRAID_QDRANT_URL").ok()
}

/// Hosted settings pointing at `qdrant_url`, with placeholder credentials.
pub fn hosted_config(qdrant_url: &str, collection: &str, dimensions: u32) -> Hosted {
	Hosted {
		qdrant: QdrantConfig {
			url: Some(qdrant_url.to_string()),
			api_key: Some(TEST_API_KEY.to_string()),
			collection: collection.to_string(),
			..Default::default()
		},
		embedding: EmbeddingProviderConfig {
			provider_id: "test".to_string(),
			api_key: Some(TEST_API_KEY.to_string()),
			dimensions,
			..Default::default()
		},
	}
}

/// Hands out unique Qdrant collection names and deletes them when dropped.
pub struct TestCollections {
	qdrant_url: String,
	names: Mutex<HashSet<String>>,
	cleaned: bool,
}
impl TestCollections {
	pub fn new(qdrant_url: impl Into<String>) -> Self {
		Self { qdrant_url: qdrant_url.into(), names: Mutex::new(HashSet::new()), cleaned: false }
	}

	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", Uuid::new_v4().simple());
		let mut tracked = self.names.lock().unwrap_or_else(|err| err.into_inner());

		tracked.insert(collection.clone());

		collection
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let collections = self.tracked();

		cleanup_qdrant_collections(&self.qdrant_url, &collections).await?;

		self.cleaned = true;

		Ok(())
	}

	fn tracked(&self) -> Vec<String> {
		self.names.lock().unwrap_or_else(|err| err.into_inner()).iter().cloned().collect()
	}
}
impl Drop for TestCollections {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let collections = self.tracked();

		if collections.is_empty() {
			return;
		}

		let qdrant_url = self.qdrant_url.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_qdrant_collections(&qdrant_url, &collections))
			{
				eprintln!("Test Qdrant cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

/// Counts fixed keywords: dimension `i` is how often `keywords[i]` occurs in the text.
///
/// The last dimension is a small constant so no vector is all zeros.
pub struct KeywordEmbedding {
	pub keywords: Vec<String>,
}
impl KeywordEmbedding {
	pub fn new<S>(keywords: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		let keywords =
			keywords.iter().map(|keyword| braid_ranking::text::fold(keyword.as_ref())).collect();

		Self { keywords }
	}

	pub fn dimensions(&self) -> u32 {
		self.keywords.len() as u32 + 1
	}

	pub fn vector(&self, text: &str) -> Vec<f32> {
		let tokens = braid_ranking::text::tokenize(text);
		let mut vector: Vec<f32> = self
			.keywords
			.iter()
			.map(|keyword| tokens.iter().filter(|token| *token == keyword).count() as f32)
			.collect();

		vector.push(0.01);

		vector
	}
}
impl EmbeddingProvider for KeywordEmbedding {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, braid_providers::Result<Vec<Vec<f32>>>> {
		let vectors: Vec<Vec<f32>> = texts.iter().map(|text| self.vector(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Returns the same constant vector for every input.
pub struct StubEmbedding {
	pub vector_dim: u32,
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, braid_providers::Result<Vec<Vec<f32>>>> {
		let vector = vec![0.1_f32; self.vector_dim as usize];
		let vectors = vec![vector; texts.len()];

		Box::pin(async move { Ok(vectors) })
	}
}

async fn cleanup_qdrant_collections(qdrant_url: &str, collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let client = Qdrant::from_url(qdrant_url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
	let max_attempts = 6;
	let mut remaining = collections.iter().cloned().collect::<HashSet<_>>();
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=max_attempts {
		let existing = time::timeout(Duration::from_secs(10), client.list_collections())
			.await
			.map_err(|_| Error::Message("Qdrant list_collections timed out.".to_string()))?
			.map_err(|err| Error::Message(format!("Failed to list Qdrant collections: {err}.")))?;
		let existing = existing.collections.into_iter().map(|c| c.name).collect::<HashSet<_>>();

		remaining.retain(|collection| existing.contains(collection));

		if remaining.is_empty() {
			return Ok(());
		}

		for collection in remaining.iter().cloned().collect::<Vec<_>>() {
			let result =
				time::timeout(Duration::from_secs(10), client.delete_collection(collection.clone()))
					.await;

			match result {
				Ok(Ok(_)) => {},
				Ok(Err(err)) =>
					if attempt == max_attempts {
						return Err(Error::Message(format!(
							"Failed to delete Qdrant collection {collection:?} after {attempt} attempts: {err}."
						)));
					},
				Err(_) =>
					if attempt == max_attempts {
						return Err(Error::Message(format!(
							"Timed out deleting Qdrant collection {collection:?} after {attempt} attempts."
						)));
					},
			}
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
	}

	Ok(())
}
