//! Axum route handlers for the Comparison API.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::comparison::orchestrator::{compare_documents, ComparisonResponse};
use crate::errors::AppError;
use crate::extraction::DocumentKind;
use crate::state::AppState;
use crate::uploads::{read_multipart, require_file};

/// POST /api/v1/compare
///
/// Multipart fields `essay1` and `essay2`. Both are validated before any extraction runs.
pub async fn handle_compare(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ComparisonResponse>, AppError> {
    let mut uploads = read_multipart(multipart).await?;
    let first = require_file(&mut uploads, "essay1", &DocumentKind::ALL)?;
    let second = require_file(&mut uploads, "essay2", &DocumentKind::ALL)?;

    let response = compare_documents(
        state.gateway.as_ref(),
        state.config.llm_timeout,
        first,
        second,
    )
    .await?;

    Ok(Json(response))
}
