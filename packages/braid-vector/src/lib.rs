pub mod hosted;
pub mod local;

mod error;

pub use braid_providers::BoxFuture;
pub use error::{Error, Result};
pub use hosted::HostedBackend;
pub use local::LocalBackend;

use std::{fmt, sync::Arc};

use braid_chunking::Chunk;
use braid_config::Config;
use braid_providers::{EmbeddingProvider, HttpEmbedding};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
	Hosted,
	Local,
}
impl BackendKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Hosted => "hosted",
			Self::Local => "local",
		}
	}
}
impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where a hit came from. Fields are `None` when a stored payload lacks them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitMetadata {
	pub chunk_index: Option<usize>,
	pub start_offset: Option<usize>,
	pub end_offset: Option<usize>,
}
impl From<&Chunk> for HitMetadata {
	fn from(chunk: &Chunk) -> Self {
		Self {
			chunk_index: Some(chunk.index),
			start_offset: Some(chunk.start_offset),
			end_offset: Some(chunk.end_offset),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct VectorHit {
	pub text: String,
	pub score: f32,
	pub metadata: HitMetadata,
}

/// Dense similarity search over chunk texts.
///
/// `search` returns at most `k` hits in descending score order, and nothing for a blank query.
pub trait VectorBackend
where
	Self: Send + Sync,
{
	fn kind(&self) -> BackendKind;

	/// Drops everything added so far. Safe to call on an empty backend.
	fn clear(&mut self) -> BoxFuture<'_, Result<()>>;

	fn add<'a>(&'a mut self, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<()>>;

	fn search<'a>(&'a self, query: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<VectorHit>>>;
}

/// Picks the hosted backend when `[hosted]` is configured, the local one otherwise.
pub async fn build_backend(cfg: &Config) -> Result<Box<dyn VectorBackend>> {
	build_backend_with(cfg, Arc::new(HttpEmbedding)).await
}

pub async fn build_backend_with(
	cfg: &Config,
	embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Box<dyn VectorBackend>> {
	let backend: Box<dyn VectorBackend> = match cfg.hosted.as_ref() {
		Some(hosted) => Box::new(HostedBackend::connect(hosted, embedder).await?),
		None => Box::new(LocalBackend::new()),
	};

	tracing::info!(backend = %backend.kind(), "Vector backend selected.");

	Ok(backend)
}

#[cfg(test)]
mod tests {
	use braid_config::Hosted;

	use super::*;

	#[tokio::test]
	async fn defaults_to_local_backend() {
		let backend = build_backend(&Config::default()).await.expect("Local backend must build.");

		assert_eq!(backend.kind(), BackendKind::Local);
	}

	#[tokio::test]
	async fn hosted_without_credentials_fails_closed() {
		let cfg = Config { hosted: Some(Hosted::default()), ..Default::default() };
		let err = build_backend(&cfg).await.err().expect("Hosted backend must not build.");

		assert!(matches!(err, Error::Configuration { .. }), "unexpected error: {err:?}");
	}

	#[test]
	fn transport_errors_name_operation_and_backend() {
		let err = Error::hosted("upsert", "connection refused");

		assert_eq!(err.to_string(), "hosted backend upsert failed: connection refused");
	}
}
