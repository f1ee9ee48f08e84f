//! Plain text out of the document formats braid can index.

mod delimited;
mod docx;
mod error;
mod pdf;

pub use error::{Error, Result};

use std::{fmt, fs, path::Path};

pub const DEFAULT_CSV_MAX_ROWS: usize = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
	Text,
	Pdf,
	Docx,
	Csv,
}
impl DocumentFormat {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Pdf => "pdf",
			Self::Docx => "docx",
			Self::Csv => "csv",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"text" | "txt" | "md" => Some(Self::Text),
			"pdf" => Some(Self::Pdf),
			"docx" => Some(Self::Docx),
			"csv" => Some(Self::Csv),
			_ => None,
		}
	}

	/// Guesses the format from the file extension. Unknown extensions are read as text.
	pub fn from_path(path: &Path) -> Self {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::parse)
			.unwrap_or(Self::Text)
	}
}
impl fmt::Display for DocumentFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug)]
pub struct ExtractOptions {
	/// Data rows kept from a CSV file; the header row is always kept.
	pub csv_max_rows: usize,
}
impl Default for ExtractOptions {
	fn default() -> Self {
		Self { csv_max_rows: DEFAULT_CSV_MAX_ROWS }
	}
}

pub fn extract_text(
	bytes: &[u8],
	format: DocumentFormat,
	opts: &ExtractOptions,
) -> Result<String> {
	let text = match format {
		DocumentFormat::Text => String::from_utf8(bytes.to_vec())?,
		DocumentFormat::Pdf => pdf::extract(bytes)?,
		DocumentFormat::Docx => docx::extract(bytes)?,
		DocumentFormat::Csv => delimited::extract(bytes, opts.csv_max_rows)?,
	};

	tracing::debug!(
		format = %format,
		bytes = bytes.len(),
		chars = text.chars().count(),
		"Document text extracted."
	);

	Ok(text)
}

/// Reads `path` and extracts its text, detecting the format from the extension unless given.
pub fn extract_file(
	path: &Path,
	format: Option<DocumentFormat>,
	opts: &ExtractOptions,
) -> Result<String> {
	let bytes = fs::read(path)?;

	extract_text(&bytes, format.unwrap_or_else(|| DocumentFormat::from_path(path)), opts)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_format_from_extension() {
		assert_eq!(DocumentFormat::from_path(Path::new("report.PDF")), DocumentFormat::Pdf);
		assert_eq!(DocumentFormat::from_path(Path::new("notes.docx")), DocumentFormat::Docx);
		assert_eq!(DocumentFormat::from_path(Path::new("rows.csv")), DocumentFormat::Csv);
		assert_eq!(DocumentFormat::from_path(Path::new("README.md")), DocumentFormat::Text);
		assert_eq!(DocumentFormat::from_path(Path::new("no_extension")), DocumentFormat::Text);
		assert_eq!(DocumentFormat::from_path(Path::new("image.png")), DocumentFormat::Text);
	}

	#[test]
	fn parses_format_names() {
		assert_eq!(DocumentFormat::parse(" Docx "), Some(DocumentFormat::Docx));
		assert_eq!(DocumentFormat::parse("txt"), Some(DocumentFormat::Text));
		assert_eq!(DocumentFormat::parse("xlsx"), None);
	}

	#[test]
	fn text_must_be_utf8() {
		let opts = ExtractOptions::default();

		assert_eq!(
			extract_text("héllo".as_bytes(), DocumentFormat::Text, &opts).expect("utf-8 text"),
			"héllo"
		);
		assert!(matches!(
			extract_text(&[0xff, 0xfe, 0x00], DocumentFormat::Text, &opts),
			Err(Error::Utf8(_))
		));
	}
}
