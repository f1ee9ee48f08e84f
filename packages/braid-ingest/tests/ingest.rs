use std::io::{Cursor, Write};

use lopdf::{
	Document, Object, Stream,
	content::{Content, Operation},
	dictionary,
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use braid_ingest::{DocumentFormat, Error, ExtractOptions, extract_text};

fn docx(body: &str) -> Vec<u8> {
	let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
	let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

	writer.start_file("word/document.xml", options).expect("Failed to start archive entry.");
	writer.write_all(body.as_bytes()).expect("Failed to write archive entry.");

	writer.finish().expect("Failed to finish archive.").into_inner()
}

fn pdf(lines: &[&str]) -> Vec<u8> {
	let mut doc = Document::with_version("1.5");
	let pages_id = doc.new_object_id();
	let font_id = doc.add_object(dictionary! {
		"Type" => "Font",
		"Subtype" => "Type1",
		"BaseFont" => "Courier",
		"Encoding" => "WinAnsiEncoding",
	});
	let resources_id = doc.add_object(dictionary! {
		"Font" => dictionary! { "F1" => font_id },
	});
	let mut kids = Vec::new();

	for line in lines {
		let content = Content {
			operations: vec![
				Operation::new("BT", vec![]),
				Operation::new("Tf", vec!["F1".into(), 12.into()]),
				Operation::new("Td", vec![72.into(), 720.into()]),
				Operation::new("Tj", vec![Object::string_literal(*line)]),
				Operation::new("ET", vec![]),
			],
		};
		let content_id = doc.add_object(Stream::new(
			dictionary! {},
			content.encode().expect("Failed to encode page content."),
		));
		let page_id = doc.add_object(dictionary! {
			"Type" => "Page",
			"Parent" => pages_id,
			"Contents" => content_id,
			"Resources" => resources_id,
			"MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
		});

		kids.push(Object::from(page_id));
	}

	let count = kids.len() as i64;

	doc.objects.insert(
		pages_id,
		Object::Dictionary(dictionary! {
			"Type" => "Pages",
			"Kids" => kids,
			"Count" => count,
		}),
	);

	let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });

	doc.trailer.set("Root", catalog_id);

	let mut bytes = Vec::new();

	doc.save_to(&mut bytes).expect("Failed to save PDF.");

	bytes
}

#[test]
fn docx_paragraphs_become_lines() {
	let body = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Rivers carry silt.</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Deltas </w:t></w:r><w:r><w:t>form.</w:t></w:r></w:p>
<w:sectPr/></w:body></w:document>"#;
	let text = extract_text(&docx(body), DocumentFormat::Docx, &ExtractOptions::default())
		.expect("Failed to extract DOCX.");

	assert_eq!(text, "Rivers carry silt.\nDeltas form.");
}

#[test]
fn docx_without_body_part_fails() {
	let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

	writer
		.start_file("word/styles.xml", SimpleFileOptions::default())
		.expect("Failed to start archive entry.");

	let bytes = writer.finish().expect("Failed to finish archive.").into_inner();
	let err = extract_text(&bytes, DocumentFormat::Docx, &ExtractOptions::default())
		.expect_err("A DOCX without a body must fail.");

	assert!(matches!(err, Error::Archive(_)), "unexpected error: {err:?}");
	assert!(matches!(
		extract_text(b"not a zip", DocumentFormat::Docx, &ExtractOptions::default()),
		Err(Error::Archive(_))
	));
}

#[test]
fn csv_keeps_header_and_caps_rows() {
	let raw = b"name,note\nalpha,\"one, two\"\nbeta,three\ngamma,four\n";
	let capped = extract_text(raw, DocumentFormat::Csv, &ExtractOptions { csv_max_rows: 2 })
		.expect("Failed to extract CSV.");

	assert_eq!(capped, "name,note\nalpha,\"one, two\"\nbeta,three\n");

	let defaults = ExtractOptions::default();
	let full = extract_text(raw, DocumentFormat::Csv, &defaults).expect("Failed to extract CSV.");

	assert_eq!(full.lines().count(), 4);
	assert_eq!(extract_text(b"", DocumentFormat::Csv, &defaults).expect("empty CSV"), "");
}

#[test]
fn pdf_pages_are_concatenated_in_order() {
	let text = extract_text(
		&pdf(&["Rivers carry silt", "Glaciers carve valleys"]),
		DocumentFormat::Pdf,
		&ExtractOptions::default(),
	)
	.expect("Failed to extract PDF.");
	let rivers = text.find("Rivers carry silt").expect("first page text");
	let glaciers = text.find("Glaciers carve valleys").expect("second page text");

	assert!(rivers < glaciers);
}

#[test]
fn unreadable_pdf_fails() {
	let err = extract_text(b"%PDF-1.5 truncated", DocumentFormat::Pdf, &ExtractOptions::default())
		.expect_err("A broken PDF must fail.");

	assert!(matches!(err, Error::Pdf(_)), "unexpected error: {err:?}");
}
