pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Document is not valid UTF-8.")]
	Utf8(#[from] std::string::FromUtf8Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error("Failed to read PDF: {0}")]
	Pdf(#[from] lopdf::Error),
	#[error("Failed to open DOCX archive: {0}")]
	Archive(#[from] zip::result::ZipError),
	#[error("Failed to parse DOCX body: {0}")]
	Xml(#[from] quick_xml::Error),
	#[error("Failed to read CSV: {0}")]
	Csv(#[from] csv::Error),
	#[error("{message}")]
	Empty { message: String },
}
