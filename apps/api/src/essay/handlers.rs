//! Axum route handlers for the Essay API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::essay::analyzer::{
    grammar_check, request_correction, strip_markup, GrammarReport, MIN_ESSAY_CHARS,
};
use crate::essay::classifier::{classify, EssayType};
use crate::essay::repository::{get_analysis, insert_analysis, NewAnalysis};
use crate::extraction::docx::{write_document, DOCX_CONTENT_TYPE};
use crate::extraction::{essay_text, extract_blocking, DocumentKind};
use crate::models::essay::EssayAnalysisRow;
use crate::state::AppState;
use crate::uploads::{read_multipart, require_file, sanitize_filename};

const MODEL_UNAVAILABLE: &str =
    "AI model unavailable - please check your API key or model configuration";
const DEFAULT_TITLE: &str = "Revised Essay";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub filename: String,
    pub essay_type: EssayType,
    pub detected_type: EssayType,
    pub essay_score: String,
    pub corrected_essay: String,
    pub suggestions: Vec<String>,
    pub criteria: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeTypeRequest {
    pub essay_text: Option<String>,
    pub target_essay_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangeTypeResponse {
    pub essay_type: EssayType,
    pub essay_score: String,
    pub corrected_essay: String,
    pub suggestions: Vec<String>,
    pub criteria: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct GrammarRequest {
    pub essay_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub final_text: Option<String>,
    pub title: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/essays/analyze
///
/// Multipart field `file`. Extracts, classifies, requests a tracked-change correction,
/// and stores the result.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let mut uploads = read_multipart(multipart).await?;
    let file = require_file(&mut uploads, "file", &DocumentKind::ALL)?;

    let paragraphs = extract_blocking(file.bytes.clone(), file.kind, file.filename.clone()).await?;
    let text = essay_text(&paragraphs);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "No text found in the document".to_string(),
        ));
    }
    if trimmed.chars().count() < MIN_ESSAY_CHARS {
        return Err(AppError::Validation(
            "Essay is too short for meaningful analysis".to_string(),
        ));
    }

    if !state.gateway.is_available() {
        return Err(AppError::ServiceUnavailable(MODEL_UNAVAILABLE.to_string()));
    }

    let detected_type = classify(&text);
    info!("Analyzing '{}' ({:?}) as {}", file.filename, file.kind, detected_type);

    let correction = request_correction(
        state.gateway.as_ref(),
        &text,
        detected_type,
        state.config.llm_timeout,
    )
    .await
    .map_err(|e| AppError::Llm(format!("Essay analysis failed: {e}")))?;

    let essay_type = correction.reported_type.unwrap_or(detected_type);

    let id = insert_analysis(
        &state.db,
        NewAnalysis {
            filename: &file.filename,
            essay_type,
            essay_score: &correction.essay_score,
            original_text: &text,
            corrected_essay: &correction.corrected_essay,
            suggestions: &correction.suggestions,
        },
    )
    .await?;

    Ok(Json(AnalysisResponse {
        id,
        filename: file.filename,
        essay_type,
        detected_type,
        essay_score: correction.essay_score,
        corrected_essay: correction.corrected_essay,
        suggestions: correction.suggestions,
        criteria: essay_type.criteria().to_vec(),
    }))
}

/// POST /api/v1/essays/change-type
///
/// Rewrites an essay toward `target_essay_type`. Existing markup is stripped first.
pub async fn handle_change_type(
    State(state): State<AppState>,
    Json(request): Json<ChangeTypeRequest>,
) -> Result<Json<ChangeTypeResponse>, AppError> {
    let (essay_text, target) = match (request.essay_text, request.target_essay_type) {
        (Some(text), Some(target)) if !text.trim().is_empty() && !target.trim().is_empty() => {
            (text, target)
        }
        _ => {
            return Err(AppError::Validation(
                "essay_text and target_essay_type are required".to_string(),
            ))
        }
    };
    let target: EssayType = target.trim().parse().map_err(AppError::Validation)?;

    if !state.gateway.is_available() {
        return Err(AppError::ServiceUnavailable(MODEL_UNAVAILABLE.to_string()));
    }

    let clean_text = strip_markup(&essay_text);
    info!("Converting essay to {target}");

    let correction = request_correction(
        state.gateway.as_ref(),
        &clean_text,
        target,
        state.config.llm_timeout,
    )
    .await
    .map_err(|e| AppError::Llm(format!("Essay type conversion failed: {e}")))?;

    // The target wins even if the model reports a different type.
    Ok(Json(ChangeTypeResponse {
        essay_type: target,
        essay_score: correction.essay_score,
        corrected_essay: correction.corrected_essay,
        suggestions: correction.suggestions,
        criteria: target.criteria().to_vec(),
    }))
}

/// POST /api/v1/essays/grammar
///
/// Always answers 200 for non-empty text; model failures yield the fallback report.
pub async fn handle_grammar(
    State(state): State<AppState>,
    Json(request): Json<GrammarRequest>,
) -> Result<Json<GrammarReport>, AppError> {
    let essay_text = request
        .essay_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("essay_text is required".to_string()))?;

    let report = grammar_check(
        state.gateway.as_ref(),
        &strip_markup(&essay_text),
        state.config.llm_timeout,
    )
    .await;
    Ok(Json(report))
}

/// POST /api/v1/essays/download
///
/// Returns the final text as a `.docx` attachment: title heading plus one paragraph
/// per blank-line-separated block.
pub async fn handle_download(Json(request): Json<DownloadRequest>) -> Result<Response, AppError> {
    let final_text = request
        .final_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No text provided for download".to_string()))?;
    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let clean_text = strip_markup(&final_text);
    let paragraphs: Vec<String> = clean_text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    let bytes = write_document(&title, &paragraphs)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build DOCX: {e}")))?;

    let disposition = format!(
        "attachment; filename=\"{}_final.docx\"",
        sanitize_filename(&title)
    );

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/essays/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EssayAnalysisRow>, AppError> {
    let row = get_analysis(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(Json(row))
}
