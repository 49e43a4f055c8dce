//! Text Extraction: turns an uploaded `.txt`, `.docx` or `.pdf` into ordered paragraph strings.
//!
//! The strategy is the `DocumentKind` resolved once from the upload's extension; content is never sniffed.
//! Container parsing is CPU-bound and third-party parsers may panic on hostile input,
//! so async callers go through `extract_blocking`, which runs on the blocking pool and
//! reports a panic as an `ExtractionError` for that file.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub mod docx;
pub mod pdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Txt,
    Docx,
    Pdf,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Txt, DocumentKind::Docx, DocumentKind::Pdf];

    /// Case-insensitive extension match. `None` for anything outside the allow-list.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(DocumentKind::Txt),
            "docx" => Some(DocumentKind::Docx),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Txt => ".txt",
            DocumentKind::Docx => ".docx",
            DocumentKind::Pdf => ".pdf",
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to extract text from '{filename}': {message}")]
pub struct ExtractionError {
    pub filename: String,
    pub message: String,
}

impl ExtractionError {
    fn new(filename: &str, message: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            message: message.into(),
        }
    }
}

/// Extracts the paragraphs of a document of the given kind. Blank lines are dropped and
/// trailing whitespace is trimmed; paragraph order is document order. `filename` only labels errors.
pub fn extract(bytes: &[u8], kind: DocumentKind, filename: &str) -> Result<Vec<String>, ExtractionError> {
    match kind {
        DocumentKind::Txt => std::str::from_utf8(bytes)
            .map(non_blank_lines)
            .map_err(|e| ExtractionError::new(filename, format!("file is not valid UTF-8: {e}"))),
        DocumentKind::Docx => docx::read_paragraphs(bytes)
            .map_err(|e| ExtractionError::new(filename, format!("error reading DOCX file: {e}"))),
        DocumentKind::Pdf => pdf::read_lines(bytes)
            .map_err(|e| ExtractionError::new(filename, format!("error reading PDF file: {e}"))),
    }
}

/// Runs `extract` on the blocking pool.
pub async fn extract_blocking(
    bytes: Bytes,
    kind: DocumentKind,
    filename: String,
) -> Result<Vec<String>, ExtractionError> {
    let name = filename.clone();
    tokio::task::spawn_blocking(move || extract(&bytes, kind, &filename))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Extraction task for '{name}' failed: {e}");
            Err(ExtractionError::new(&name, "document could not be parsed"))
        })
}

/// Joins paragraphs with a blank line, the form used when prompting the LLM.
pub fn essay_text(paragraphs: &[String]) -> String {
    paragraphs.join("\n\n")
}

pub(crate) fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename_is_case_insensitive() {
        assert_eq!(DocumentKind::from_filename("essay.DOCX"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_filename("notes.txt"), Some(DocumentKind::Txt));
        assert_eq!(DocumentKind::from_filename("scan.Pdf"), Some(DocumentKind::Pdf));
    }

    #[test]
    fn test_kind_rejects_unknown_or_missing_extension() {
        assert_eq!(DocumentKind::from_filename("essay.doc"), None);
        assert_eq!(DocumentKind::from_filename("essay"), None);
        assert_eq!(DocumentKind::from_filename("archive.txt.exe"), None);
    }

    #[test]
    fn test_txt_extraction_drops_blank_lines() {
        let text = "First line.  \r\n\r\nSecond line.\n   \nThird.";
        let lines = extract(text.as_bytes(), DocumentKind::Txt, "draft.txt").unwrap();
        assert_eq!(lines, vec!["First line.", "Second line.", "Third."]);
    }

    #[test]
    fn test_txt_extraction_rejects_invalid_utf8() {
        let err = extract(&[0xff, 0xfe, 0x00], DocumentKind::Txt, "broken.txt").unwrap_err();
        assert_eq!(err.filename, "broken.txt");
        assert!(err.message.contains("UTF-8"));
    }

    #[test]
    fn test_docx_extraction_reads_paragraphs() {
        let bytes = docx::write_document(
            "Title",
            &["Body one.".to_string(), "Body two.".to_string()],
        )
        .unwrap();
        let lines = extract(&bytes, DocumentKind::Docx, "essay.docx").unwrap();
        assert_eq!(lines, vec!["Title", "Body one.", "Body two."]);
    }

    #[test]
    fn test_kind_decides_strategy_not_filename() {
        let err = extract(b"plain text", DocumentKind::Docx, "notes.txt").unwrap_err();
        assert!(err.message.contains("DOCX"));
        let lines = extract(b"plain text", DocumentKind::Txt, "upload").unwrap();
        assert_eq!(lines, vec!["plain text"]);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_reported_not_panicked() {
        let result = extract_blocking(
            Bytes::from_static(b"not a pdf at all"),
            DocumentKind::Pdf,
            "bad.pdf".into(),
        ).await;
        let err = result.unwrap_err();
        assert_eq!(err.filename, "bad.pdf");
    }

    #[test]
    fn test_essay_text_separates_paragraphs_with_blank_line() {
        let text = essay_text(&["One.".to_string(), "Two.".to_string()]);
        assert_eq!(text, "One.\n\nTwo.");
    }
}
