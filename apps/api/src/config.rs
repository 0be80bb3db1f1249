use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default ceiling for one multipart request body.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

/// Which question-answering collaborator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaBackend {
    Mock,
    Llm,
}

impl FromStr for QaBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(QaBackend::Mock),
            "llm" => Ok(QaBackend::Llm),
            other => bail!("QA_BACKEND must be 'mock' or 'llm', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Everything has a default except the API key, which only the LLM backend needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    /// Mock extraction delay, per résumé file.
    pub processing_delay: Duration,
    /// Mock answer delay, per question.
    pub answer_delay: Duration,
    pub qa_backend: QaBackend,
    pub anthropic_api_key: Option<String>,
    /// Fixed RNG seed for reproducible mock batches.
    pub mock_seed: Option<u64>,
    /// Sessions untouched this long are evicted.
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let qa_backend: QaBackend = optional_env("QA_BACKEND")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(QaBackend::Mock);
        let anthropic_api_key = optional_env("ANTHROPIC_API_KEY");
        if qa_backend == QaBackend::Llm && anthropic_api_key.is_none() {
            bail!("ANTHROPIC_API_KEY is required when QA_BACKEND=llm");
        }

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            processing_delay: Duration::from_millis(parse_env("PROCESSING_DELAY_MS", 2000)?),
            answer_delay: Duration::from_millis(parse_env("ANSWER_DELAY_MS", 1500)?),
            session_ttl: Duration::from_secs(parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?),
            qa_backend,
            anthropic_api_key,
            mock_seed: optional_env("MOCK_SEED")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("MOCK_SEED must be an unsigned integer")?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qa_backend_parsing() {
        assert_eq!("mock".parse::<QaBackend>().unwrap(), QaBackend::Mock);
        assert_eq!(" LLM ".parse::<QaBackend>().unwrap(), QaBackend::Llm);
        assert!("openai".parse::<QaBackend>().is_err());
    }

    #[test]
    fn test_parse_env_default_and_error() {
        std::env::remove_var("CV_ANALYZER_TEST_UNSET");
        assert_eq!(parse_env("CV_ANALYZER_TEST_UNSET", 42u16).unwrap(), 42);

        std::env::set_var("CV_ANALYZER_TEST_BAD_PORT", "eighty");
        assert!(parse_env::<u16>("CV_ANALYZER_TEST_BAD_PORT", 8080).is_err());
        std::env::remove_var("CV_ANALYZER_TEST_BAD_PORT");
    }
}
