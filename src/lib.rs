//! mampfsearch - search and question answering over lecture recordings
//!
//! Lecture subtitles are chunked into sentence-complete passages, embedded as
//! dense, sparse and multi-vector representations, and retrieved with one of
//! several strategies. A benchmark scores those strategies against labelled
//! questions by NDCG.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `subtitle` - SRT/WebVTT parsing and composition
//! - `chunking` - Subtitle and plain-text chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector index abstraction and backends
//! - `reranker` - Cross-encoder reranking
//! - `retrieval` - Retrieval strategies
//! - `benchmark` - NDCG evaluation and reports
//! - `rag` - Answer synthesis
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use mampfsearch::chunking::ChunkingConfig;
//! use mampfsearch::config::Settings;
//! use mampfsearch::orchestrator::Pipeline;
//! use mampfsearch::retrieval::RetrieverKind;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let config = ChunkingConfig::new(350, 750, true);
//!     pipeline
//!         .ingest_subtitles("la01.srt".as_ref(), "linear-algebra", "la01", "Lectures", &config)
//!         .await?;
//!
//!     let retriever = pipeline.retriever(RetrieverKind::Hybrid, false);
//!     for item in retriever.retrieve("What is a basis?", "Lectures", 5).await? {
//!         println!("{:.3} {}", item.score, item.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod benchmark;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod reranker;
pub mod retrieval;
pub mod subtitle;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{MampfError, Result};
