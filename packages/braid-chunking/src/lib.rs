use std::{collections::HashMap, iter};

pub const DEFAULT_CHUNK_SIZE: usize = 900;
pub const DEFAULT_OVERLAP: usize = 120;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub chunk_size: usize,
	pub overlap: usize,
}
impl Default for ChunkingConfig {
	fn default() -> Self {
		Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP }
	}
}

/// A contiguous slice of a document.
///
/// Offsets count characters, not bytes. `index` is the chunk's position in the chunking
/// output and is the identity used for citations; it never changes after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
	pub index: usize,
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

/// The frozen chunking of one piece of text.
#[derive(Clone, Debug, Default)]
pub struct Document {
	chunks: Vec<Chunk>,
	text_len: usize,
	first_index_by_text: HashMap<String, usize>,
}
impl Document {
	pub fn new(text: &str, cfg: &ChunkingConfig) -> Self {
		let chunks = chunk_text(text, cfg.chunk_size, cfg.overlap);

		tracing::debug!(
			chunks = chunks.len(),
			chunk_size = cfg.chunk_size,
			overlap = cfg.overlap,
			"Document chunked."
		);

		Self::from_parts(chunks, text.chars().count())
	}

	fn from_parts(chunks: Vec<Chunk>, text_len: usize) -> Self {
		let mut first_index_by_text = HashMap::with_capacity(chunks.len());

		for chunk in &chunks {
			first_index_by_text.entry(chunk.text.clone()).or_insert(chunk.index);
		}

		Self { chunks, text_len, first_index_by_text }
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	/// Length of the source text in characters.
	pub fn text_len(&self) -> usize {
		self.text_len
	}

	pub fn get(&self, index: usize) -> Option<&Chunk> {
		self.chunks.get(index)
	}

	/// Index of the first chunk whose text is exactly `text`.
	pub fn citation_for(&self, text: &str) -> Option<usize> {
		self.first_index_by_text.get(text).copied()
	}
}

/// Splits `text` into windows of `chunk_size` characters that advance by
/// `chunk_size - overlap` (at least one character).
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
	if chunk_size == 0 || text.is_empty() {
		return Vec::new();
	}

	let boundaries: Vec<usize> =
		text.char_indices().map(|(idx, _)| idx).chain(iter::once(text.len())).collect();
	let len = boundaries.len() - 1;
	let step = chunk_size.saturating_sub(overlap).max(1);
	let mut chunks = Vec::with_capacity(len.div_ceil(step));
	let mut start = 0_usize;

	while start < len {
		let end = start.saturating_add(chunk_size).min(len);

		chunks.push(Chunk {
			index: chunks.len(),
			start_offset: start,
			end_offset: end,
			text: text[boundaries[start]..boundaries[end]].to_string(),
		});

		start += step;
	}

	chunks
}
