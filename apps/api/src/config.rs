use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Missing key leaves the gateway in unavailable mode; the diff features still work.
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout: Duration::from_secs(
                parse_env("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for in-process router tests. No database is contacted.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/essay_api_test".to_string(),
            gemini_api_key: None,
            port: 0,
            rust_log: "debug".to_string(),
            llm_timeout: Duration::from_secs(5),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
