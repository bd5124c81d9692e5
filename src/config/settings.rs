//! Configuration settings for mampfsearch.

use crate::error::{MampfError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub reranker: RerankerSettings,
    pub llm: LlmSettings,
    pub benchmark: BenchmarkSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.mampfsearch".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProvider {
    /// BGE-M3 inference service (dense + sparse + multi-vector).
    #[default]
    BgeM3,
    /// OpenAI embeddings API (dense only).
    Openai,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bge-m3" | "bge" => Ok(EmbeddingProvider::BgeM3),
            "openai" => Ok(EmbeddingProvider::Openai),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::BgeM3 => write!(f, "bge-m3"),
            EmbeddingProvider::Openai => write!(f, "openai"),
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Base URL of the embedding service (ignored for `openai`).
    pub base_url: String,
    /// Embedding model to use.
    pub model: String,
    /// Dense embedding dimensions.
    pub dimensions: u32,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Maximum embedding requests in flight during ingestion.
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::BgeM3,
            base_url: "http://localhost:8080".to_string(),
            model: "BAAI/bge-m3".to_string(),
            dimensions: 1024,
            batch_size: 16,
            max_concurrent: 2,
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Default lecture collection.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.mampfsearch/index.db".to_string(),
            collection: "Lectures".to_string(),
        }
    }
}

/// Subtitle and text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Minimum characters per chunk before growth stops.
    pub min_chunk_size: usize,
    /// Maximum characters per chunk.
    pub max_chunk_size: usize,
    /// Pad each chunk with its neighbouring blocks.
    pub overlap: bool,
    /// Sentences per chunk for plain-text files.
    pub max_sentences_per_chunk: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            min_chunk_size: 350,
            max_chunk_size: 750,
            overlap: true,
            max_sentences_per_chunk: 5,
        }
    }
}

/// Retrieval defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Retriever strategy (dense, hybrid, hybrid+colbert).
    pub retriever: String,
    /// Results returned per query.
    pub limit: usize,
    /// Candidates fetched per sub-index before fusion or reranking.
    pub prefetch_limit: usize,
    /// Decorate the retriever with the cross-encoder.
    pub reranking: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            retriever: "hybrid".to_string(),
            limit: 5,
            prefetch_limit: 50,
            reranking: false,
        }
    }
}

/// Cross-encoder reranker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            model: "BAAI/bge-reranker-v2-m3".to_string(),
            timeout_secs: 30,
        }
    }
}

/// LLM settings for answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API base.
    pub base_url: String,
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/v1".to_string(),
            model: "openai/gpt-oss-20b".to_string(),
            api_key: None,
            temperature: 0.5,
        }
    }
}

/// How the ideal ranking for NDCG is formed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdealOrder {
    /// Judgments in the order the dataset lists them.
    #[default]
    AsGiven,
    /// Judgments sorted by relevance, highest first.
    Sorted,
}

/// A named cross-encoder model used in benchmark suites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankerProfile {
    pub name: String,
    pub model: String,
}

/// Benchmark suite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Dataset JSON files to evaluate.
    pub datasets: Vec<String>,
    /// Retriever strategies to evaluate.
    pub retrievers: Vec<String>,
    /// Rerankers applied on top of each retriever.
    pub rerankers: Vec<RerankerProfile>,
    /// Directory for CSV result files.
    pub results_dir: String,
    pub ideal_order: IdealOrder,
    /// Index each subtitle cue as-is instead of chunking.
    pub verbatim_cues: bool,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            datasets: Vec::new(),
            retrievers: vec!["dense".to_string(), "hybrid".to_string()],
            rerankers: vec![
                RerankerProfile {
                    name: "bge-reranker".to_string(),
                    model: "BAAI/bge-reranker-v2-m3".to_string(),
                },
                RerankerProfile {
                    name: "ms-marco-MiniLM-L12-v2".to_string(),
                    model: "cross-encoder/ms-marco-MiniLM-L12-v2".to_string(),
                },
            ],
            results_dir: ".".to_string(),
            ideal_order: IdealOrder::AsGiven,
            verbatim_cues: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings no pipeline could run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size < self.chunking.min_chunk_size {
            return Err(MampfError::InvalidConfiguration(format!(
                "chunking.max_chunk_size ({}) must be >= chunking.min_chunk_size ({})",
                self.chunking.max_chunk_size, self.chunking.min_chunk_size
            )));
        }
        if self.retrieval.limit == 0 {
            return Err(MampfError::InvalidConfiguration(
                "retrieval.limit must be positive".to_string(),
            ));
        }
        if self.retrieval.prefetch_limit == 0 {
            return Err(MampfError::InvalidConfiguration(
                "retrieval.prefetch_limit must be positive".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(MampfError::InvalidConfiguration(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        let mut urls = vec![
            ("reranker.base_url", &self.reranker.base_url),
            ("llm.base_url", &self.llm.base_url),
        ];
        if self.embedding.provider == EmbeddingProvider::BgeM3 {
            urls.push(("embedding.base_url", &self.embedding.base_url));
        }
        for (key, value) in urls {
            url::Url::parse(value).map_err(|e| {
                MampfError::InvalidConfiguration(format!("{} '{}' is not a valid URL: {}", key, value, e))
            })?;
        }

        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| MampfError::InvalidConfiguration(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mampfsearch")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded benchmark results directory.
    pub fn results_dir(&self) -> PathBuf {
        Self::expand_path(&self.benchmark.results_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_chunk_bounds() {
        let mut settings = Settings::default();
        settings.chunking.min_chunk_size = 500;
        settings.chunking.max_chunk_size = 100;
        assert!(matches!(
            settings.validate(),
            Err(MampfError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut settings = Settings::default();
        settings.llm.base_url = "not a url".to_string();
        assert!(matches!(
            settings.validate(),
            Err(MampfError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chunking]
            min_chunk_size = 100

            [benchmark]
            ideal_order = "sorted"
            "#,
        )
        .unwrap();

        assert_eq!(settings.chunking.min_chunk_size, 100);
        assert_eq!(settings.chunking.max_chunk_size, 750);
        assert_eq!(settings.benchmark.ideal_order, IdealOrder::Sorted);
        assert_eq!(settings.retrieval.prefetch_limit, 50);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::BgeM3);
    }

    #[test]
    fn test_parse_embedding_provider() {
        assert_eq!("bge-m3".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::BgeM3);
        assert_eq!("OpenAI".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Openai);
        assert!("word2vec".parse::<EmbeddingProvider>().is_err());
    }
}
