//! Hybrid retrieval: dense + sparse prefetch, fused or rescored by the index.

use super::{ensure_limit, RetrievalItem, Retriever};
use crate::embedding::{Embedder, Representations};
use crate::error::Result;
use crate::vector_store::{Query, VectorIndex};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Prefetch depth actually used for a request.
///
/// A prefetch shallower than `limit` would silently cap the result count, so
/// it is raised to `limit`.
fn effective_prefetch(prefetch_limit: usize, limit: usize) -> usize {
    if prefetch_limit < limit {
        warn!(
            "prefetch_limit ({}) is below the requested limit ({}); prefetching {} instead",
            prefetch_limit, limit, limit
        );
        limit
    } else {
        prefetch_limit
    }
}

/// Dense and sparse candidates merged with reciprocal rank fusion.
pub struct HybridRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    prefetch_limit: usize,
}

impl HybridRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, prefetch_limit: usize) -> Self {
        Self {
            embedder,
            index,
            prefetch_limit,
        }
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    #[instrument(skip(self))]
    async fn retrieve(&self, query: &str, collection: &str, limit: usize) -> Result<Vec<RetrievalItem>> {
        ensure_limit(limit)?;

        let embedding = self.embedder.embed(query, Representations::HYBRID).await?;
        let query = Query::Fusion {
            dense: embedding.dense()?.to_vec(),
            sparse: embedding.sparse()?.clone(),
            prefetch_limit: effective_prefetch(self.prefetch_limit, limit),
        };

        let points = self.index.query(collection, &query, limit).await?;
        debug!("Hybrid search returned {} points", points.len());
        Ok(points.into_iter().map(RetrievalItem::from).collect())
    }

    fn name(&self) -> &str {
        "HybridRetriever"
    }
}

/// Hybrid candidates reranked by token-level MaxSim on the colbert field.
pub struct HybridColbertRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    prefetch_limit: usize,
}

impl HybridColbertRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, prefetch_limit: usize) -> Self {
        Self {
            embedder,
            index,
            prefetch_limit,
        }
    }
}

#[async_trait]
impl Retriever for HybridColbertRetriever {
    #[instrument(skip(self))]
    async fn retrieve(&self, query: &str, collection: &str, limit: usize) -> Result<Vec<RetrievalItem>> {
        ensure_limit(limit)?;

        let embedding = self.embedder.embed(query, Representations::ALL).await?;
        let query = Query::FusionRerank {
            dense: embedding.dense()?.to_vec(),
            sparse: embedding.sparse()?.clone(),
            colbert: embedding.multivector()?.to_vec(),
            prefetch_limit: effective_prefetch(self.prefetch_limit, limit),
        };

        let points = self.index.query(collection, &query, limit).await?;
        debug!("Hybrid+colbert search returned {} points", points.len());
        Ok(points.into_iter().map(RetrievalItem::from).collect())
    }

    fn name(&self) -> &str {
        "HybridColbertRerankingRetriever"
    }
}
