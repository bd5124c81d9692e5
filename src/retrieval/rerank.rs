//! Cross-encoder reranking decorator.

use super::{ensure_limit, RetrievalItem, Retriever};
use crate::error::Result;
use crate::reranker::CrossEncoder;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Widens the base retriever to `prefetch_limit` candidates and reorders them
/// with a cross-encoder. Only the score changes; every other field is carried
/// over from the base result.
pub struct RerankerRetriever {
    base: Arc<dyn Retriever>,
    cross_encoder: Arc<dyn CrossEncoder>,
    prefetch_limit: usize,
}

impl RerankerRetriever {
    pub fn new(base: Arc<dyn Retriever>, cross_encoder: Arc<dyn CrossEncoder>, prefetch_limit: usize) -> Self {
        Self {
            base,
            cross_encoder,
            prefetch_limit,
        }
    }

    pub fn base(&self) -> &dyn Retriever {
        self.base.as_ref()
    }
}

#[async_trait]
impl Retriever for RerankerRetriever {
    #[instrument(skip(self), fields(base = self.base.name(), model = self.cross_encoder.model()))]
    async fn retrieve(&self, query: &str, collection: &str, limit: usize) -> Result<Vec<RetrievalItem>> {
        ensure_limit(limit)?;

        let candidates = self
            .base
            .retrieve(query, collection, self.prefetch_limit.max(limit))
            .await?;
        let documents: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();

        let ranked = self.cross_encoder.rank(query, &documents).await?;
        debug!("Cross-encoder ranked {} of {} candidates", ranked.len(), candidates.len());

        let mut items = Vec::with_capacity(limit.min(ranked.len()));
        for document in ranked.into_iter().take(limit) {
            match candidates.get(document.index) {
                Some(candidate) => items.push(RetrievalItem {
                    score: document.score,
                    ..candidate.clone()
                }),
                None => warn!(
                    "Cross-encoder returned index {} for {} candidates; skipping",
                    document.index,
                    candidates.len()
                ),
            }
        }

        Ok(items)
    }

    fn name(&self) -> &str {
        "RerankerRetriever"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Location;
    use crate::error::MampfError;
    use crate::reranker::RankedDocument;
    use std::sync::Mutex;

    /// Returns a fixed list of candidates and records the requested limit.
    struct FixedRetriever {
        items: Vec<RetrievalItem>,
        requested: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str, _collection: &str, limit: usize) -> Result<Vec<RetrievalItem>> {
            self.requested.lock().unwrap().push(limit);
            Ok(self.items.iter().take(limit).cloned().collect())
        }

        fn name(&self) -> &str {
            "FixedRetriever"
        }
    }

    struct ScriptedCrossEncoder(Vec<RankedDocument>);

    #[async_trait]
    impl CrossEncoder for ScriptedCrossEncoder {
        async fn rank(&self, _query: &str, _documents: &[String]) -> Result<Vec<RankedDocument>> {
            Ok(self.0.clone())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn item(position: u32, score: f32) -> RetrievalItem {
        RetrievalItem {
            score,
            text: format!("passage {}", position),
            location: Location::Video {
                course_id: "ana".to_string(),
                lecture_id: format!("l{}", position),
                start_seconds: position as f64,
                end_seconds: position as f64 + 5.0,
            },
            position: Some(position),
        }
    }

    fn base() -> Arc<FixedRetriever> {
        Arc::new(FixedRetriever {
            items: vec![item(0, 0.9), item(1, 0.8), item(2, 0.7)],
            requested: Mutex::new(Vec::new()),
        })
    }

    fn ranked(pairs: &[(usize, f32)]) -> Vec<RankedDocument> {
        pairs
            .iter()
            .map(|&(index, score)| RankedDocument { index, score })
            .collect()
    }

    #[tokio::test]
    async fn test_reorders_and_replaces_only_score() {
        let base = base();
        let encoder = ScriptedCrossEncoder(ranked(&[(2, 5.0), (0, 3.0), (1, -1.0)]));
        let retriever = RerankerRetriever::new(base.clone(), Arc::new(encoder), 50);

        let items = retriever.retrieve("q", "Lectures", 2).await.unwrap();

        assert_eq!(items.len(), 2);
        let expected_first = RetrievalItem {
            score: 5.0,
            ..item(2, 0.0)
        };
        assert_eq!(items[0], expected_first);
        assert_eq!(items[1].text, "passage 0");
        assert_eq!(items[1].location, item(0, 0.0).location);
        assert_eq!(items[1].score, 3.0);
        assert_eq!(*base.requested.lock().unwrap(), vec![50]);
    }

    #[tokio::test]
    async fn test_fewer_results_than_limit() {
        let encoder = ScriptedCrossEncoder(ranked(&[(1, 0.4)]));
        let retriever = RerankerRetriever::new(base(), Arc::new(encoder), 50);

        let items = retriever.retrieve("q", "Lectures", 5).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].position, Some(1));
    }

    #[tokio::test]
    async fn test_out_of_range_index_skipped() {
        let encoder = ScriptedCrossEncoder(ranked(&[(7, 0.9), (0, 0.5)]));
        let retriever = RerankerRetriever::new(base(), Arc::new(encoder), 50);

        let items = retriever.retrieve("q", "Lectures", 2).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].position, Some(0));
    }

    #[tokio::test]
    async fn test_prefetch_at_least_limit() {
        let base = base();
        let encoder = ScriptedCrossEncoder(Vec::new());
        let retriever = RerankerRetriever::new(base.clone(), Arc::new(encoder), 2);

        retriever.retrieve("q", "Lectures", 3).await.unwrap();
        assert_eq!(*base.requested.lock().unwrap(), vec![3]);

        assert!(matches!(
            retriever.retrieve("q", "Lectures", 0).await,
            Err(MampfError::InvalidConfiguration(_))
        ));
    }
}
