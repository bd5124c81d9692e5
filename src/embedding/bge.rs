//! BGE-M3 inference service client.
//!
//! The service embeds a batch of texts in one call and can return all three
//! representations: `dense_vecs`, `lexical_weights` (token id to weight) and
//! `colbert_vecs`.

use super::{Embedder, Embedding, Representations, SparseVector};
use crate::config::EmbeddingSettings;
use crate::error::{MampfError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// HTTP client for a BGE-M3 embedding service.
pub struct BgeM3Embedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    max_retries: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    return_dense: bool,
    return_sparse: bool,
    return_colbert_vecs: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    index: usize,
    #[serde(default)]
    dense_vecs: Option<Vec<f32>>,
    #[serde(default)]
    lexical_weights: Option<HashMap<String, f32>>,
    #[serde(default)]
    colbert_vecs: Option<Vec<Vec<f32>>>,
}

impl BgeM3Embedder {
    pub fn new(base_url: &str, model: &str, dimensions: usize) -> Result<Self> {
        Self::with_options(base_url, model, dimensions, 16, Duration::from_secs(120), 3)
    }

    pub fn with_options(
        base_url: &str,
        model: &str,
        dimensions: usize,
        batch_size: usize,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MampfError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embed", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
            batch_size: batch_size.max(1),
            max_retries: max_retries.max(1),
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::with_options(
            &settings.base_url,
            &settings.model,
            settings.dimensions as usize,
            settings.batch_size,
            Duration::from_secs(settings.timeout_secs),
            settings.max_retries,
        )
    }

    async fn request_batch(
        &self,
        texts: &[String],
        representations: Representations,
    ) -> Result<Vec<Embedding>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
            return_dense: representations.dense,
            return_sparse: representations.sparse,
            return_colbert_vecs: representations.multivector,
        };

        let mut attempt = 0usize;
        loop {
            match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbedResponse = resp.json().await.map_err(|e| {
                            MampfError::Embedding(format!("Failed to parse embedding response: {}", e))
                        })?;
                        return convert_response(parsed, texts.len(), representations);
                    }

                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!("Embedding service returned {}, retrying (attempt {})", status, attempt);
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(MampfError::Embedding(format!(
                        "Embedding request to {} failed ({}): {}",
                        self.endpoint, status, body
                    )));
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect()) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!("Embedding service unreachable, retrying (attempt {}): {}", attempt, err);
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(MampfError::ServiceUnavailable(format!(
                        "Embedding service at {}: {}",
                        self.endpoint, err
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl Embedder for BgeM3Embedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str, representations: Representations) -> Result<Embedding> {
        let embeddings = self.embed_batch(&[text.to_string()], representations).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MampfError::Embedding(format!("Empty embedding response for query '{}'", text)))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(
        &self,
        texts: &[String],
        representations: Representations,
    ) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.request_batch(chunk, representations).await?);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn convert_response(
    mut response: EmbedResponse,
    expected: usize,
    representations: Representations,
) -> Result<Vec<Embedding>> {
    if response.data.len() != expected {
        return Err(MampfError::Embedding(format!(
            "Embedding service returned {} embeddings for {} inputs",
            response.data.len(),
            expected
        )));
    }
    response.data.sort_by_key(|entry| entry.index);

    response
        .data
        .into_iter()
        .map(|entry| {
            let sparse = match entry.lexical_weights {
                Some(weights) => Some(convert_lexical_weights(weights)?),
                None => None,
            };
            let embedding = Embedding {
                dense: entry.dense_vecs,
                sparse,
                multivector: entry.colbert_vecs,
            };

            if representations.dense {
                embedding.dense()?;
            }
            if representations.sparse {
                embedding.sparse()?;
            }
            if representations.multivector {
                embedding.multivector()?;
            }
            Ok(embedding)
        })
        .collect()
}

fn convert_lexical_weights(weights: HashMap<String, f32>) -> Result<SparseVector> {
    let mut pairs = weights
        .into_iter()
        .map(|(token, weight)| {
            token
                .parse::<u32>()
                .map(|id| (id, weight))
                .map_err(|_| MampfError::Embedding(format!("Invalid token id in lexical weights: {}", token)))
        })
        .collect::<Result<Vec<_>>>()?;
    pairs.sort_by_key(|(id, _)| *id);
    Ok(SparseVector::from_weights(pairs))
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}
