//! Cross-encoder reranking of candidate passages.

mod http;

pub use http::HttpCrossEncoder;

use crate::error::Result;
use async_trait::async_trait;

/// One document's position in the candidate list and its relevance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDocument {
    /// Index into the documents passed to [`CrossEncoder::rank`].
    pub index: usize,
    pub score: f32,
}

/// A model that scores (query, document) pairs jointly.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Score every document against the query, best first.
    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<RankedDocument>>;

    /// Model identifier, for logs and reports.
    fn model(&self) -> &str;
}
