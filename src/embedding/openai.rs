//! OpenAI embeddings implementation (dense only).

use super::{Embedder, Embedding, Representations};
use crate::config::EmbeddingSettings;
use crate::error::{MampfError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
///
/// Only produces dense vectors, so it can back the dense retriever but not
/// the hybrid ones.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder with custom model and dimensions.
    pub fn with_config(model: &str, dimensions: usize, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(None, None, timeout)?,
            model: model.to_string(),
            dimensions,
            batch_size: 100,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let mut embedder = Self::with_config(
            &settings.model,
            settings.dimensions as usize,
            Duration::from_secs(settings.timeout_secs),
        )?;
        embedder.batch_size = settings.batch_size.max(1);
        Ok(embedder)
    }
}

fn ensure_dense_only(representations: Representations) -> Result<()> {
    if representations.sparse || representations.multivector {
        return Err(MampfError::Embedding(
            "The openai provider only produces dense embeddings; use the bge-m3 provider for hybrid retrieval"
                .to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
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
        ensure_dense_only(representations)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| MampfError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| MampfError::Embedding(format!("Embedding API error: {}", e)))?;

            let mut data = response.data;
            data.sort_by_key(|e| e.index);
            all_embeddings.extend(data.into_iter().map(|e| Embedding {
                dense: Some(e.embedding),
                ..Default::default()
            }));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder =
            OpenAIEmbedder::with_config("text-embedding-3-large", 3072, Duration::from_secs(10)).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[tokio::test]
    async fn test_rejects_sparse_request() {
        let embedder =
            OpenAIEmbedder::with_config("text-embedding-3-small", 1536, Duration::from_secs(10)).unwrap();
        let result = embedder.embed("query", Representations::HYBRID).await;
        assert!(matches!(result, Err(MampfError::Embedding(_))));
    }
}
