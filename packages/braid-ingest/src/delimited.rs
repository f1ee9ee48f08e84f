use std::io;

use crate::Result;

/// Re-serializes the header and the first `max_rows` data rows.
pub(crate) fn extract(bytes: &[u8], max_rows: usize) -> Result<String> {
	let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
	let headers = reader.headers()?.clone();

	if headers.is_empty() {
		return Ok(String::new());
	}

	let mut writer = csv::WriterBuilder::new()
		.flexible(true)
		.terminator(csv::Terminator::Any(b'\n'))
		.from_writer(Vec::new());

	writer.write_record(&headers)?;

	let mut rows = 0_usize;

	for record in reader.records().take(max_rows) {
		writer.write_record(&record?)?;

		rows += 1;
	}

	tracing::debug!(rows, max_rows, "CSV rows kept.");

	let bytes = writer.into_inner().map_err(|err| io::Error::other(err.error().to_string()))?;

	Ok(String::from_utf8(bytes)?)
}
