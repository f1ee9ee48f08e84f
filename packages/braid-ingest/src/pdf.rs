use lopdf::Document;

use crate::{Error, Result};

/// Concatenates the text of every page in page order. Pages that fail to decode are skipped.
pub(crate) fn extract(bytes: &[u8]) -> Result<String> {
	let document = Document::load_mem(bytes)?;
	let mut text = String::new();

	for page_number in document.get_pages().into_keys() {
		match document.extract_text(&[page_number]) {
			Ok(page_text) => text.push_str(&page_text),
			Err(err) => {
				tracing::debug!(page = page_number, error = %err, "Skipped unreadable PDF page.");
			},
		}
	}

	if text.trim().is_empty() {
		return Err(Error::Empty {
			message: "PDF contains no extractable text (it may be image only).".to_string(),
		});
	}

	Ok(text)
}
