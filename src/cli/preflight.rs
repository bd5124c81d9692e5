//! Pre-flight checks before expensive operations.
//!
//! Validates that the model services an operation depends on answer at all
//! before starting work that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{MampfError, Result};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion requires the embedding service.
    Ingest,
    /// Search requires the embedding service, plus the reranker when reranking.
    Search { reranking: bool },
    /// Asking also requires the LLM.
    Ask { reranking: bool },
    /// Benchmarks need the reranker unless reranked runs are skipped.
    Benchmark { reranking: bool },
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error naming the unreachable service.
pub async fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_embedding(settings).await?;
    match operation {
        Operation::Ingest => {}
        Operation::Search { reranking } | Operation::Benchmark { reranking } => {
            if reranking {
                probe("Reranker", &settings.reranker.base_url).await?;
            }
        }
        Operation::Ask { reranking } => {
            if reranking {
                probe("Reranker", &settings.reranker.base_url).await?;
            }
            probe("LLM", &settings.llm.base_url).await?;
        }
    }
    Ok(())
}

async fn check_embedding(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        EmbeddingProvider::BgeM3 => probe("Embedding service", &settings.embedding.base_url).await,
        EmbeddingProvider::Openai => check_api_key(),
    }
}

/// Check that something answers HTTP at `url`. Any status counts as reachable.
pub async fn probe(service: &str, url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| MampfError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e)))?;

    client
        .get(url)
        .send()
        .await
        .map(|_| ())
        .map_err(|e| MampfError::ServiceUnavailable(format!("{} at {} is not reachable: {}", service, url, e)))
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        _ => Err(MampfError::InvalidConfiguration(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
