//! Retrieval strategies over a lecture collection.
//!
//! Every retriever turns a query into at most `limit` items ordered by
//! descending score and never writes to the index. Variants:
//!
//! - [`DenseRetriever`]: cosine nearest neighbours on the dense field.
//! - [`HybridRetriever`]: dense and sparse prefetch fused with RRF.
//! - [`HybridColbertRetriever`]: hybrid prefetch rescored by multi-vector MaxSim.
//! - [`RerankerRetriever`]: decorates any of the above with a cross-encoder.

mod dense;
mod hybrid;
mod rerank;

pub use dense::DenseRetriever;
pub use hybrid::{HybridColbertRetriever, HybridRetriever};
pub use rerank::RerankerRetriever;

use crate::chunking::{Chunk, Location};
use crate::embedding::Embedder;
use crate::error::{MampfError, Result};
use crate::vector_store::{ScoredPoint, VectorIndex};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A scored passage returned by a retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalItem {
    pub score: f32,
    pub text: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl From<ScoredPoint> for RetrievalItem {
    fn from(point: ScoredPoint) -> Self {
        let Chunk {
            text,
            location,
            position,
        } = point.payload;
        Self {
            score: point.score,
            text,
            location,
            position,
        }
    }
}

/// Trait for retrieval strategies.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve at most `limit` items from `collection`, best first.
    async fn retrieve(&self, query: &str, collection: &str, limit: usize) -> Result<Vec<RetrievalItem>>;

    /// Strategy name as used in benchmark reports.
    fn name(&self) -> &str;
}

/// Base retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RetrieverKind {
    #[serde(rename = "dense")]
    Dense,
    #[default]
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "hybrid+colbert")]
    HybridColbert,
}

impl std::str::FromStr for RetrieverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dense" => Ok(RetrieverKind::Dense),
            "hybrid" => Ok(RetrieverKind::Hybrid),
            "hybrid+colbert" | "hybrid_colbert" | "colbert" => Ok(RetrieverKind::HybridColbert),
            _ => Err(format!(
                "Unknown retriever: {}. Use dense, hybrid, or hybrid+colbert.",
                s
            )),
        }
    }
}

impl std::fmt::Display for RetrieverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrieverKind::Dense => write!(f, "dense"),
            RetrieverKind::Hybrid => write!(f, "hybrid"),
            RetrieverKind::HybridColbert => write!(f, "hybrid+colbert"),
        }
    }
}

/// Build an undecorated retriever of the given kind.
pub fn create_retriever(
    kind: RetrieverKind,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    prefetch_limit: usize,
) -> Arc<dyn Retriever> {
    match kind {
        RetrieverKind::Dense => Arc::new(DenseRetriever::new(embedder, index)),
        RetrieverKind::Hybrid => Arc::new(HybridRetriever::new(embedder, index, prefetch_limit)),
        RetrieverKind::HybridColbert => {
            Arc::new(HybridColbertRetriever::new(embedder, index, prefetch_limit))
        }
    }
}

pub(crate) fn ensure_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(MampfError::InvalidConfiguration(
            "Retrieval limit must be positive".to_string(),
        ));
    }
    Ok(())
}
