//! Dense nearest-neighbour retrieval.

use super::{ensure_limit, RetrievalItem, Retriever};
use crate::embedding::{Embedder, Representations};
use crate::error::Result;
use crate::vector_store::{Query, VectorIndex};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Cosine search on the dense field; scores are the index's similarities.
pub struct DenseRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl DenseRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl Retriever for DenseRetriever {
    #[instrument(skip(self))]
    async fn retrieve(&self, query: &str, collection: &str, limit: usize) -> Result<Vec<RetrievalItem>> {
        ensure_limit(limit)?;

        let embedding = self.embedder.embed(query, Representations::DENSE).await?;
        let query = Query::Dense {
            dense: embedding.dense()?.to_vec(),
        };

        let points = self.index.query(collection, &query, limit).await?;
        debug!("Dense search returned {} points", points.len());
        Ok(points.into_iter().map(RetrievalItem::from).collect())
    }

    fn name(&self) -> &str {
        "DenseRetriever"
    }
}
