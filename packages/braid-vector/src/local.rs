use braid_chunking::Chunk;
use braid_ranking::{TfidfMatrix, cmp_f32_desc};

use crate::{BackendKind, BoxFuture, HitMetadata, Result, VectorBackend, VectorHit};

/// In-process TF-IDF similarity. No network, no persistence.
///
/// Every `add` refits the vectorizer over all chunks seen so far, so batch additions.
#[derive(Clone, Debug, Default)]
pub struct LocalBackend {
	chunks: Vec<Chunk>,
	matrix: TfidfMatrix,
}
impl LocalBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	fn refit(&mut self) {
		let texts: Vec<&str> = self.chunks.iter().map(|chunk| chunk.text.as_str()).collect();

		self.matrix = TfidfMatrix::new(&texts);
	}

	fn rank(&self, query: &str, k: usize) -> Vec<VectorHit> {
		if k == 0 || self.is_empty() || query.trim().is_empty() {
			return Vec::new();
		}

		let sims = self.matrix.similarities(query);
		let mut positions: Vec<usize> = (0..sims.len()).collect();

		positions.sort_by(|left, right| {
			cmp_f32_desc(sims[*left], sims[*right]).then_with(|| left.cmp(right))
		});
		positions.truncate(k);

		positions
			.into_iter()
			.map(|position| {
				let chunk = &self.chunks[position];

				VectorHit {
					text: chunk.text.clone(),
					score: sims[position],
					metadata: HitMetadata::from(chunk),
				}
			})
			.collect()
	}
}
impl VectorBackend for LocalBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Local
	}

	fn clear(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.chunks.clear();
			self.matrix = TfidfMatrix::default();

			Ok(())
		})
	}

	fn add<'a>(&'a mut self, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if chunks.is_empty() {
				return Ok(());
			}

			self.chunks.extend_from_slice(chunks);
			self.refit();

			tracing::debug!(added = chunks.len(), total = self.chunks.len(), "Local index refit.");

			Ok(())
		})
	}

	fn search<'a>(&'a self, query: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(async move { Ok(self.rank(query, k)) })
	}
}
