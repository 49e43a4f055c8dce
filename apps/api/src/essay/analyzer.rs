//! Essay critique via the LLM gateway: tracked-change corrections and grammar scoring.
//!
//! Replies are free-form and only loosely follow the requested schema, so every field
//! is read as an untyped optional value (absent, null, or the wrong type) and defaulted
//! on the way out.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::essay::classifier::EssayType;
use crate::essay::prompts::{
    CORRECTION_PROMPT_TEMPLATE, CORRECTION_TEXT_LIMIT, GRAMMAR_PROMPT_TEMPLATE, GRAMMAR_TEXT_LIMIT,
};
use crate::llm_client::prompts::{truncate_chars, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{call_json, GatewayError, LlmGateway};

/// Score reported when the model omits one.
pub const DEFAULT_SCORE: &str = "75";
/// Essays shorter than this (trimmed, in characters) are rejected before prompting.
pub const MIN_ESSAY_CHARS: usize = 50;

const FALLBACK_SUGGESTION: &str = "Unable to perform detailed analysis due to missing AI model.";

/// Normalized correction reply.
#[derive(Debug, Clone, Serialize)]
pub struct EssayCorrection {
    /// Type the model claims to have applied, if it named a known one.
    pub reported_type: Option<EssayType>,
    pub essay_score: String,
    pub corrected_essay: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarReport {
    pub overall_score: String,
    pub suggestions: Vec<String>,
    /// True when the report is the canned fallback rather than a model reply.
    pub fallback: bool,
}

#[derive(Debug, Default, Deserialize)]
struct CorrectionReply {
    essay_type: Option<Value>,
    essay_score: Option<Value>,
    corrected_essay: Option<Value>,
    suggestions: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GrammarReply {
    overall_score: Option<Value>,
    suggestions: Option<Value>,
}

pub fn build_correction_prompt(essay_text: &str, essay_type: EssayType) -> String {
    let name = essay_type.display_name();
    CORRECTION_PROMPT_TEMPLATE
        .replace("{essay_type_lower}", &name.to_lowercase())
        .replace("{essay_type}", name)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{essay_text}", truncate_chars(essay_text, CORRECTION_TEXT_LIMIT))
}

/// Asks the model for a tracked-change correction of `essay_text` as `essay_type`.
/// Missing fields fall back to the default score, the original text, and no suggestions.
pub async fn request_correction(
    gateway: &dyn LlmGateway,
    essay_text: &str,
    essay_type: EssayType,
    timeout: Duration,
) -> Result<EssayCorrection, GatewayError> {
    let prompt = build_correction_prompt(essay_text, essay_type);
    let reply: CorrectionReply = call_json(gateway, &prompt, timeout).await?;

    Ok(EssayCorrection {
        reported_type: reply
            .essay_type
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|t| t.trim().parse().ok()),
        essay_score: reply
            .essay_score
            .as_ref()
            .and_then(score_to_string)
            .unwrap_or_else(|| DEFAULT_SCORE.to_string()),
        corrected_essay: reply
            .corrected_essay
            .as_ref()
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(String::from)
            .unwrap_or_else(|| essay_text.to_string()),
        suggestions: suggestions_to_strings(reply.suggestions),
    })
}

/// Grammar and style score. Never fails: gateway errors and unusable replies
/// produce the fallback report.
pub async fn grammar_check(
    gateway: &dyn LlmGateway,
    essay_text: &str,
    timeout: Duration,
) -> GrammarReport {
    let prompt = GRAMMAR_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{essay_text}", truncate_chars(essay_text, GRAMMAR_TEXT_LIMIT));

    match call_json::<GrammarReply>(gateway, &prompt, timeout).await {
        Ok(reply) => GrammarReport {
            overall_score: reply
                .overall_score
                .as_ref()
                .and_then(score_to_string)
                .unwrap_or_else(|| DEFAULT_SCORE.to_string()),
            suggestions: suggestions_to_strings(reply.suggestions),
            fallback: false,
        },
        Err(e) => {
            warn!("Grammar check fell back to default report: {e}");
            fallback_grammar_report()
        }
    }
}

pub fn fallback_grammar_report() -> GrammarReport {
    GrammarReport {
        overall_score: DEFAULT_SCORE.to_string(),
        suggestions: vec![FALLBACK_SUGGESTION.to_string()],
        fallback: true,
    }
}

/// Removes HTML-like tags (e.g. leftover `<del>`/`<ins>` markup) from text.
pub fn strip_markup(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
    tag.replace_all(text, "").into_owned()
}

fn score_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list keeps its non-null items; a lone non-empty string becomes one suggestion;
/// anything else yields none.
fn suggestions_to_strings(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}
