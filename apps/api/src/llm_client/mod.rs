/// LLM Gateway: the single point of entry for all model calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Handlers receive an `Arc<dyn LlmGateway>` from `AppState`; tests inject fakes.
///
/// The gateway is untrusted: replies are free-form text that may or may not contain
/// the JSON object a prompt asked for. `call_json` recovers that object or fails with
/// `GatewayError::MalformedResponse` (never retried).
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls.
pub const MODEL: &str = "gemini-1.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 4096;
/// One initial attempt plus at most one retry on transport errors, 429 and 5xx.
const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no JSON object found in model response")]
    MalformedResponse,

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("AI model unavailable - no API key configured")]
    Unavailable,
}

/// Text-in / text-out model boundary.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;

    /// False when the gateway can never succeed (e.g. no credentials).
    fn is_available(&self) -> bool {
        true
    }
}

/// Runs `generate` under a deadline, mapping expiry to `GatewayError::Timeout`.
pub async fn generate_with_timeout(
    gateway: &dyn LlmGateway,
    prompt: &str,
    timeout: Duration,
) -> Result<String, GatewayError> {
    tokio::time::timeout(timeout, gateway.generate(prompt))
        .await
        .map_err(|_| GatewayError::Timeout(timeout))?
}

/// Calls the gateway and deserializes the JSON object embedded in its reply.
pub async fn call_json<T: DeserializeOwned>(
    gateway: &dyn LlmGateway,
    prompt: &str,
    timeout: Duration,
) -> Result<T, GatewayError> {
    let text = generate_with_timeout(gateway, prompt, timeout).await?;
    let json = extract_json_object(&text).ok_or(GatewayError::MalformedResponse)?;
    serde_json::from_str(json).map_err(GatewayError::Parse)
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client. Constructed without a key it stays in
/// "unavailable" mode and fails every call with `GatewayError::Unavailable`.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn endpoint() -> String {
        format!("{GEMINI_API_BASE}/{MODEL}:generateContent")
    }
}

#[async_trait]
impl LlmGateway for GeminiClient {
    /// Retries once on 429 / 5xx / transport errors with a 1s backoff.
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::Unavailable)?;

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let mut last_error: Option<GatewayError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(Self::endpoint())
                .header("x-goog-api-key", api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GatewayError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(GatewayError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(GatewayError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: GenerateContentResponse = response.json().await?;

            if let Some(usage) = &parsed.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return parsed.text().ok_or(GatewayError::EmptyContent);
        }

        Err(last_error.unwrap_or(GatewayError::EmptyContent))
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reply parsing
// ────────────────────────────────────────────────────────────────────────────

/// Locates the JSON object in a free-form reply: code fences are stripped, then the
/// span from the first `{` to the last `}` is returned.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_json_fences(text);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted gateways for handler and orchestrator tests.

    use std::sync::Mutex;

    use super::*;

    /// Answers each prompt by the first matching `(needle, reply)` rule.
    /// Prompts matching no rule fail with a 503-style API error.
    pub struct ScriptedGateway {
        rules: Vec<(String, Result<String, u16>)>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self {
                rules: Vec::new(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn reply(mut self, needle: &str, reply: &str) -> Self {
            self.rules.push((needle.to_string(), Ok(reply.to_string())));
            self
        }

        pub fn fail(mut self, needle: &str, status: u16) -> Self {
            self.rules.push((needle.to_string(), Err(status)));
            self
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let rule = self.rules.iter().find(|(needle, _)| prompt.contains(needle));
            match rule {
                Some((_, Ok(reply))) => Ok(reply.clone()),
                Some((_, Err(status))) => Err(GatewayError::Api {
                    status: *status,
                    message: "scripted failure".to_string(),
                }),
                None => Err(GatewayError::Api {
                    status: 503,
                    message: "no scripted reply".to_string(),
                }),
            }
        }
    }

    /// Never answers; used to exercise timeouts.
    pub struct HangingGateway;

    #[async_trait]
    impl LlmGateway for HangingGateway {
        async fn generate(&self, _prompt: &str) -> Result<String, GatewayError> {
            std::future::pending::<()>().await;
            Err(GatewayError::EmptyContent)
        }
    }
}
