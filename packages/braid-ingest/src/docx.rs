use std::io::{Cursor, Read};

use quick_xml::{Reader, events::Event};
use zip::ZipArchive;

use crate::Result;

const BODY_PART: &str = "word/document.xml";

/// Joins the text runs of each `w:p` paragraph, one paragraph per line.
pub(crate) fn extract(bytes: &[u8]) -> Result<String> {
	let mut archive = ZipArchive::new(Cursor::new(bytes))?;
	let mut xml = String::new();

	archive.by_name(BODY_PART)?.read_to_string(&mut xml)?;

	Ok(paragraphs(&xml)?.join("\n"))
}

fn paragraphs(xml: &str) -> Result<Vec<String>> {
	let mut reader = Reader::from_str(xml);
	let mut paragraphs = Vec::new();
	let mut current: Option<String> = None;
	let mut in_text = false;

	loop {
		match reader.read_event()? {
			Event::Start(tag) => match tag.local_name().as_ref() {
				b"p" => current = Some(String::new()),
				b"t" => in_text = true,
				_ => {},
			},
			Event::Empty(tag) => match tag.local_name().as_ref() {
				b"p" => paragraphs.push(String::new()),
				b"tab" => append(&mut current, "\t"),
				b"br" | b"cr" => append(&mut current, "\n"),
				_ => {},
			},
			Event::Text(content) if in_text => append(&mut current, &content.unescape()?),
			Event::End(tag) => match tag.local_name().as_ref() {
				b"t" => in_text = false,
				b"p" => paragraphs.extend(current.take()),
				_ => {},
			},
			Event::Eof => break,
			_ => {},
		}
	}

	Ok(paragraphs)
}

fn append(current: &mut Option<String>, text: &str) {
	if let Some(paragraph) = current.as_mut() {
		paragraph.push_str(text);
	}
}
