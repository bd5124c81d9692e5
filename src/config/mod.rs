//! Configuration module for mampfsearch.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    BenchmarkSettings, ChunkingSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    IdealOrder, LlmSettings, PromptSettings, RerankerProfile, RerankerSettings,
    RetrievalSettings, Settings, VectorStoreSettings,
};
