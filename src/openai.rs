//! OpenAI-compatible client configuration.
//!
//! Answer synthesis talks to a local OpenAI-compatible server (vLLM, Ollama)
//! as often as to OpenAI itself, so the base URL and key are explicit.

use crate::error::{MampfError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for completion and embedding requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Placeholder key accepted by local OpenAI-compatible servers.
const PLACEHOLDER_API_KEY: &str = "dummy";

/// Create a client for the given base URL.
///
/// The key is taken from `api_key`, then `OPENAI_API_KEY`, then a placeholder.
pub fn create_client(
    base_url: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MampfError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e)))?;

    let key = api_key
        .map(str::to_string)
        .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
        .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());

    let mut config = OpenAIConfig::new().with_api_key(key);
    if let Some(base) = base_url {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
