//! Comparison Orchestrator: extraction, structural diff, and prose analysis for two drafts.
//!
//! # Failure model
//! - Extraction failure of either file is fatal to the request.
//! - The structural diff runs on the blocking pool; a join failure is an internal error.
//! - Each of the three prose calls is independent and best-effort: a gateway error or
//!   timeout becomes a descriptive string in its field, never a request failure.
//!
//! The structural diff and the three prose calls run concurrently.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::comparison::prompts::{build_differences_prompt, build_summary_prompt};
use crate::diff::{align, annotate_opcodes, render_view, OpcodeView, RenderedView};
use crate::errors::AppError;
use crate::extraction::extract_blocking;
use crate::llm_client::{generate_with_timeout, LlmGateway};
use crate::uploads::UploadedFile;

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResponse {
    pub status: &'static str,
    pub comparison: StructuralComparison,
    pub analysis: ProseAnalysis,
    pub file1_name: String,
    pub file2_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuralComparison {
    pub summary: StructuralSummary,
    pub rendered_view: RenderedView,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuralSummary {
    pub ratio: f64,
    pub opcodes: Vec<OpcodeView>,
}

/// Model-written prose. Each field holds either the reply or an error description.
#[derive(Debug, Clone, Serialize)]
pub struct ProseAnalysis {
    pub draft1_analysis: String,
    pub draft2_analysis: String,
    pub key_differences: String,
}

pub async fn compare_documents(
    gateway: &dyn LlmGateway,
    timeout: Duration,
    first: UploadedFile,
    second: UploadedFile,
) -> Result<ComparisonResponse, AppError> {
    let (first_lines, second_lines) = tokio::try_join!(
        extract_blocking(first.bytes, first.kind, first.filename.clone()),
        extract_blocking(second.bytes, second.kind, second.filename.clone()),
    )?;

    info!(
        "Comparing '{}' ({} lines) with '{}' ({} lines)",
        first.filename,
        first_lines.len(),
        second.filename,
        second_lines.len()
    );

    let first_text = first_lines.join("\n");
    let second_text = second_lines.join("\n");

    let structural =
        tokio::task::spawn_blocking(move || structural_comparison(&first_lines, &second_lines));

    let (structural, analysis) = tokio::join!(
        structural,
        analyze_prose(gateway, &first_text, &second_text, timeout)
    );

    let comparison = structural.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in structural diff: {e}"))
    })?;

    Ok(ComparisonResponse {
        status: "success",
        comparison,
        analysis,
        file1_name: first.filename,
        file2_name: second.filename,
        timestamp: Utc::now(),
    })
}

/// Line-level alignment plus the annotated opcodes and side-by-side view built from it.
pub fn structural_comparison(original: &[String], revised: &[String]) -> StructuralComparison {
    let summary = align(original, revised);
    StructuralComparison {
        summary: StructuralSummary {
            ratio: summary.similarity_ratio,
            opcodes: annotate_opcodes(&summary, original, revised),
        },
        rendered_view: render_view(&summary, original, revised),
    }
}

async fn analyze_prose(
    gateway: &dyn LlmGateway,
    first_text: &str,
    second_text: &str,
    timeout: Duration,
) -> ProseAnalysis {
    let first_prompt = build_summary_prompt(1, first_text);
    let second_prompt = build_summary_prompt(2, second_text);
    let differences_prompt = build_differences_prompt(first_text, second_text);

    let (first, second, differences) = tokio::join!(
        generate_with_timeout(gateway, &first_prompt, timeout),
        generate_with_timeout(gateway, &second_prompt, timeout),
        generate_with_timeout(gateway, &differences_prompt, timeout),
    );

    ProseAnalysis {
        draft1_analysis: prose_or_error(first, "Error analyzing first essay"),
        draft2_analysis: prose_or_error(second, "Error analyzing second essay"),
        key_differences: prose_or_error(differences, "Error generating comparison"),
    }
}

fn prose_or_error<E: std::fmt::Display>(result: Result<String, E>, context: &str) -> String {
    match result {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("{context}: {e}");
            format!("{context}: {e}")
        }
    }
}
