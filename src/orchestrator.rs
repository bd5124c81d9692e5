//! Pipeline orchestrator for mampfsearch.
//!
//! Owns the external clients (embedder, vector index, cross-encoder, LLM),
//! builds them once from the settings and hands them to retrievers, the
//! benchmark and the answer engine.

use crate::chunking::{chunk_subtitle_file, chunk_text_file, Chunk, ChunkingConfig};
use crate::config::{EmbeddingProvider, Prompts, Settings};
use crate::embedding::{create_embedder, Embedder, Embedding, Representations};
use crate::error::{MampfError, Result};
use crate::rag::{AnswerEngine, CompletionModel, OpenAiCompletion};
use crate::reranker::{CrossEncoder, HttpCrossEncoder};
use crate::retrieval::{create_retriever, RerankerRetriever, Retriever, RetrieverKind};
use crate::vector_store::{create_vector_index, CollectionSpec, Point, VectorIndex};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Whether [`Pipeline::ensure_collection`] had to create the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub name: String,
    pub created: bool,
}

/// Result of ingesting one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    pub collection: String,
    /// Chunks produced from the source.
    pub chunks: usize,
    /// Points written to the index.
    pub inserted: usize,
}

/// The main orchestrator for the mampfsearch pipeline.
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    cross_encoder: Arc<dyn CrossEncoder>,
    completion: Arc<dyn CompletionModel>,
}

impl Pipeline {
    /// Build every client from the settings. No service is contacted here.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = create_embedder(&settings.embedding)?;
        let index = create_vector_index(&settings)?;
        let cross_encoder: Arc<dyn CrossEncoder> = Arc::new(HttpCrossEncoder::from_settings(&settings.reranker)?);
        let completion: Arc<dyn CompletionModel> = Arc::new(OpenAiCompletion::from_settings(&settings.llm)?);

        info!(
            embedder = %settings.embedding.provider,
            index = %settings.vector_store.provider,
            "Pipeline ready"
        );

        Ok(Self {
            settings,
            prompts,
            embedder,
            index,
            cross_encoder,
            completion,
        })
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        cross_encoder: Arc<dyn CrossEncoder>,
        completion: Arc<dyn CompletionModel>,
    ) -> Self {
        Self {
            settings,
            prompts: Prompts::default(),
            embedder,
            index,
            cross_encoder,
            completion,
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> Arc<dyn VectorIndex> {
        self.index.clone()
    }

    /// Create `name` unless it already exists.
    #[instrument(skip(self))]
    pub async fn ensure_collection(&self, name: &str) -> Result<CollectionStatus> {
        if self.index.collection_exists(name).await? {
            debug!("Collection {} exists", name);
            return Ok(CollectionStatus {
                name: name.to_string(),
                created: false,
            });
        }

        let spec = CollectionSpec::new(self.embedder.dimensions());
        self.index.create_collection(name, &spec).await?;
        info!("Created collection {} ({} dimensions)", name, spec.dense_dimension);

        Ok(CollectionStatus {
            name: name.to_string(),
            created: true,
        })
    }

    /// Chunk a subtitle file and index it into `collection`.
    #[instrument(skip(self, config), fields(path = %path.display()))]
    pub async fn ingest_subtitles(
        &self,
        path: &Path,
        course_id: &str,
        lecture_id: &str,
        collection: &str,
        config: &ChunkingConfig,
    ) -> Result<IngestResult> {
        let chunks = chunk_subtitle_file(path, course_id, lecture_id, config, None)?;
        self.ingest_source(collection, chunks).await
    }

    /// Sentence-chunk a plain-text file and index it into `collection`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_text_file(&self, path: &Path, course_id: &str, collection: &str) -> Result<IngestResult> {
        let chunks = chunk_text_file(path, course_id, self.settings.chunking.max_sentences_per_chunk)?;
        self.ingest_source(collection, chunks).await
    }

    async fn ingest_source(&self, collection: &str, chunks: Vec<Chunk>) -> Result<IngestResult> {
        self.ensure_collection(collection).await?;
        let count = chunks.len();
        let inserted = self.ingest_chunks(collection, chunks).await?;

        Ok(IngestResult {
            collection: collection.to_string(),
            chunks: count,
            inserted,
        })
    }

    /// Embed chunks and upsert them with fresh ids. The collection must exist.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn ingest_chunks(&self, collection: &str, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embed_chunks(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(MampfError::Embedding(format!(
                "Expected {} embeddings for collection {}, got {}",
                chunks.len(),
                collection,
                embeddings.len()
            )));
        }

        let points = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Point::new(chunk, embedding))
            .collect::<Result<Vec<_>>>()?;

        let inserted = self.index.upsert(collection, &points).await?;
        info!("Indexed {} chunks into {}", inserted, collection);
        Ok(inserted)
    }

    /// Embed in batches, several requests in flight, preserving chunk order.
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Embedding>> {
        let batch_size = self.settings.embedding.batch_size.max(1);
        let max_concurrent = self.settings.embedding.max_concurrent.max(1);
        let representations = self.index_representations();

        let batches: Vec<Vec<String>> = chunks
            .chunks(batch_size)
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();
        debug!("Embedding {} batches, {} in flight", batches.len(), max_concurrent);

        let results: Vec<Result<Vec<Embedding>>> = stream::iter(batches)
            .map(|texts| {
                let embedder = self.embedder.clone();
                async move { embedder.embed_batch(&texts, representations).await }
            })
            .buffered(max_concurrent)
            .collect()
            .await;

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in results {
            embeddings.extend(batch?);
        }
        Ok(embeddings)
    }

    /// Representations stored per point. OpenAI embeddings are dense only.
    fn index_representations(&self) -> Representations {
        match self.settings.embedding.provider {
            EmbeddingProvider::BgeM3 => Representations::ALL,
            EmbeddingProvider::Openai => Representations::DENSE,
        }
    }

    /// An undecorated retriever.
    pub fn base_retriever(&self, kind: RetrieverKind) -> Arc<dyn Retriever> {
        create_retriever(
            kind,
            self.embedder.clone(),
            self.index.clone(),
            self.settings.retrieval.prefetch_limit,
        )
    }

    /// A retriever, optionally decorated with the configured cross-encoder.
    pub fn retriever(&self, kind: RetrieverKind, reranking: bool) -> Arc<dyn Retriever> {
        let base = self.base_retriever(kind);
        if !reranking {
            return base;
        }
        Arc::new(RerankerRetriever::new(
            base,
            self.cross_encoder.clone(),
            self.settings.retrieval.prefetch_limit,
        ))
    }

    /// Retriever kind and reranking flag from `[retrieval]`.
    pub fn default_retriever(&self) -> Result<Arc<dyn Retriever>> {
        let kind: RetrieverKind = self
            .settings
            .retrieval
            .retriever
            .parse()
            .map_err(MampfError::InvalidConfiguration)?;
        Ok(self.retriever(kind, self.settings.retrieval.reranking))
    }

    pub fn answer_engine(&self, retriever: Arc<dyn Retriever>) -> AnswerEngine {
        AnswerEngine::new(retriever, self.completion.clone()).with_prompts(self.prompts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Answer;
    use crate::testing::{FakeEmbedder, KeywordCrossEncoder};
    use crate::vector_store::MemoryVectorIndex;
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use tokio_test::{assert_err, assert_ok};

    struct SilentCompletion;

    #[async_trait]
    impl CompletionModel for SilentCompletion {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        fn model(&self) -> &str {
            "silent"
        }
    }

    fn pipeline(settings: Settings, embedder: Arc<FakeEmbedder>) -> Pipeline {
        Pipeline::with_components(
            settings,
            embedder,
            Arc::new(MemoryVectorIndex::new()),
            Arc::new(KeywordCrossEncoder),
            Arc::new(SilentCompletion),
        )
    }

    fn chunk(i: usize) -> Chunk {
        Chunk {
            text: format!("Passage number {} about groups.", i),
            location: crate::chunking::Location::File {
                course_id: "algebra".to_string(),
                file_id: "notes".to_string(),
            },
            position: Some(i as u32),
        }
    }

    #[tokio::test]
    async fn test_ensure_collection_is_idempotent() {
        let pipeline = pipeline(Settings::default(), Arc::new(FakeEmbedder::default()));

        let first = assert_ok!(pipeline.ensure_collection("Lectures").await);
        let second = assert_ok!(pipeline.ensure_collection("Lectures").await);
        assert!(first.created);
        assert!(!second.created);
    }

    #[tokio::test]
    async fn test_ingest_chunks_batches_in_order() {
        let mut settings = Settings::default();
        settings.embedding.batch_size = 3;
        settings.embedding.max_concurrent = 2;
        let embedder = Arc::new(FakeEmbedder::default());
        let pipeline = pipeline(settings, embedder.clone());

        pipeline.ensure_collection("Lectures").await.unwrap();
        let inserted = pipeline
            .ingest_chunks("Lectures", (0..8).map(chunk).collect())
            .await
            .unwrap();
        assert_eq!(inserted, 8);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);

        let items = pipeline
            .base_retriever(RetrieverKind::Dense)
            .retrieve("Passage number 6 about groups.", "Lectures", 1)
            .await
            .unwrap();
        assert_eq!(items[0].position, Some(6));
    }

    #[tokio::test]
    async fn test_ingest_requires_collection() {
        let pipeline = pipeline(Settings::default(), Arc::new(FakeEmbedder::default()));
        let err = assert_err!(pipeline.ingest_chunks("Missing", vec![chunk(0)]).await);
        assert!(matches!(err, MampfError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_ingest_subtitles_creates_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("l01.srt");
        std::fs::write(
            &path,
            "1\n00:00:00,000 --> 00:00:02,000\nHello world.\n\n2\n00:00:02,000 --> 00:00:05,000\nThis is a test.\n",
        )
        .unwrap();
        let pipeline = pipeline(Settings::default(), Arc::new(FakeEmbedder::default()));

        let result = pipeline
            .ingest_subtitles(&path, "algebra", "l01", "Lectures", &ChunkingConfig::new(1, 1000, false))
            .await
            .unwrap();
        assert_eq!(result.chunks, 2);
        assert_eq!(result.inserted, 2);
        assert_eq!(pipeline.index().collection_info("Lectures").await.unwrap().points, 2);
    }

    #[tokio::test]
    async fn test_retriever_construction() {
        let pipeline = pipeline(Settings::default(), Arc::new(FakeEmbedder::default()));
        assert_eq!(pipeline.retriever(RetrieverKind::Hybrid, false).name(), "HybridRetriever");
        assert!(pipeline.default_retriever().is_ok());

        let engine = pipeline.answer_engine(pipeline.retriever(RetrieverKind::Dense, true));
        let answer = engine.answer_from("q", &[]).await.unwrap();
        assert_eq!(answer, Answer::new(crate::rag::NO_CONTEXT_ANSWER));
    }
}
