//! Multipart upload plumbing shared by the essay and comparison endpoints.

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::extraction::DocumentKind;

/// A raw multipart file part, before validation.
#[derive(Debug)]
pub struct RawUpload {
    pub field: String,
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// A validated upload: allowed extension, non-empty name and content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Sanitized filename, safe to echo back in responses.
    pub filename: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

/// Drains every part of the multipart body.
pub async fn read_multipart(mut multipart: Multipart) -> Result<Vec<RawUpload>, AppError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload '{name}': {e}")))?;
        uploads.push(RawUpload {
            field: name,
            filename,
            bytes,
        });
    }
    Ok(uploads)
}

/// Takes the part named `field` and validates it against `allowed`.
pub fn require_file(
    uploads: &mut Vec<RawUpload>,
    field: &str,
    allowed: &[DocumentKind],
) -> Result<UploadedFile, AppError> {
    let position = uploads
        .iter()
        .position(|u| u.field == field)
        .ok_or_else(|| AppError::Validation(format!("Missing file upload '{field}'")))?;
    let upload = uploads.remove(position);

    let filename = upload
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("Upload '{field}' has no filename")))?;

    let kind = DocumentKind::from_filename(&filename)
        .filter(|kind| allowed.contains(kind))
        .ok_or_else(|| {
            let allowed: Vec<&str> = allowed.iter().map(|k| k.extension()).collect();
            AppError::Validation(format!(
                "'{}' is not an allowed file type. Allowed: {}",
                sanitize_filename(&filename),
                allowed.join(", ")
            ))
        })?;

    if upload.bytes.is_empty() {
        return Err(AppError::Validation(format!(
            "'{}' is empty",
            sanitize_filename(&filename)
        )));
    }

    Ok(UploadedFile {
        filename: sanitize_filename(&filename),
        kind,
        bytes: upload.bytes,
    })
}

/// Basename of a client-supplied filename with anything outside `[A-Za-z0-9._-]` replaced by `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
