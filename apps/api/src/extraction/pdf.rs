use pdf_extract::OutputError;

/// Extracts the text layer of a PDF and returns its non-blank lines.
pub fn read_lines(bytes: &[u8]) -> Result<Vec<String>, OutputError> {
    let text = pdf_extract::extract_text_from_mem(bytes)?;
    Ok(super::non_blank_lines(&text))
}
