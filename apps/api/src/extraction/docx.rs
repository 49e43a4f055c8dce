//! Minimal WordprocessingML support: paragraph text out of a `.docx`, and a plain
//! heading-plus-paragraphs `.docx` back in.

use std::io::{Cursor, Read, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const DOCUMENT_PART: &str = "word/document.xml";
/// Upper bound on the inflated size of `word/document.xml`.
pub const MAX_DOCUMENT_XML_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("invalid zip container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document body exceeds {limit} bytes when decompressed")]
    TooLarge { limit: u64 },
}

/// Reads every non-blank paragraph of the main document part, trimmed, in order.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocxError> {
    read_paragraphs_within(bytes, MAX_DOCUMENT_XML_BYTES)
}

/// Declared sizes are checked first; the read itself is capped so a lying header cannot
/// inflate past `limit` either.
fn read_paragraphs_within(bytes: &[u8], limit: u64) -> Result<Vec<String>, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let entry = archive.by_name(DOCUMENT_PART)?;
    if entry.size() > limit {
        return Err(DocxError::TooLarge { limit });
    }

    let mut raw = Vec::new();
    entry.take(limit + 1).read_to_end(&mut raw)?;
    if raw.len() as u64 > limit {
        return Err(DocxError::TooLarge { limit });
    }
    let xml = String::from_utf8(raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text_run = true,
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push(' '),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push(' '),
                b"w:p" => current.clear(),
                _ => {}
            },
            Event::Text(t) if in_text_run => current.push_str(&t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Builds a `.docx` with `title` as a centered bold 16pt heading followed by one paragraph
/// per entry. The heading is formatted directly; the package carries no styles part.
pub fn write_document(title: &str, paragraphs: &[String]) -> Result<Vec<u8>, DocxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS_XML.as_bytes())?;

    zip.start_file(DOCUMENT_PART, options)?;
    zip.write_all(document_xml(title, paragraphs).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn document_xml(title: &str, paragraphs: &[String]) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        quick_xml::escape::escape(title)
    ));
    for paragraph in paragraphs {
        body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            quick_xml::escape::escape(paragraph.as_str())
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;
