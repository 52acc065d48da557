use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::analysis::models::AnalyzerBackend;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub analyzer_backend: AnalyzerBackend,
    /// Required only when `analyzer_backend` is `Llm`.
    pub anthropic_api_key: Option<String>,
    pub llm_timeout: Duration,
    /// Total LLM attempts per analysis, first call included. Capped at 3 by the client.
    pub llm_max_attempts: u32,
    pub role_catalog_path: Option<PathBuf>,
    pub analysis_config_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let analyzer_backend = parse_backend(&env_or("ANALYZER_BACKEND", "heuristic"))?;
        let anthropic_api_key = match analyzer_backend {
            AnalyzerBackend::Llm => Some(require_env("ANTHROPIC_API_KEY")?),
            AnalyzerBackend::Heuristic => optional_env("ANTHROPIC_API_KEY"),
        };

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            analyzer_backend,
            anthropic_api_key,
            llm_timeout: Duration::from_secs(
                env_or("LLM_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            llm_max_attempts: parse_attempts(&env_or("LLM_MAX_ATTEMPTS", "2"))?,
            role_catalog_path: optional_env("ROLE_CATALOG_PATH").map(PathBuf::from),
            analysis_config_path: optional_env("ANALYSIS_CONFIG_PATH").map(PathBuf::from),
            max_upload_bytes: match optional_env("MAX_UPLOAD_BYTES") {
                Some(raw) => raw
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        })
    }
}

fn parse_backend(raw: &str) -> Result<AnalyzerBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "heuristic" => Ok(AnalyzerBackend::Heuristic),
        "llm" | "ai" => Ok(AnalyzerBackend::Llm),
        other => bail!("ANALYZER_BACKEND must be 'heuristic' or 'llm', got '{other}'"),
    }
}

fn parse_attempts(raw: &str) -> Result<u32> {
    let attempts = raw
        .trim()
        .parse::<u32>()
        .context("LLM_MAX_ATTEMPTS must be a positive integer")?;
    if attempts == 0 {
        bail!("LLM_MAX_ATTEMPTS must be at least 1");
    }
    Ok(attempts)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
