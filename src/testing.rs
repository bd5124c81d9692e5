//! Deterministic stand-ins for the external models, for unit tests.

use crate::embedding::{Embedder, Embedding, Representations, SparseVector};
use crate::error::Result;
use crate::reranker::{CrossEncoder, RankedDocument};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const FAKE_DIMENSIONS: usize = 64;

fn fnv1a(word: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in word.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn one_hot(word: &str) -> Vec<f32> {
    let mut v = vec![0.0; FAKE_DIMENSIONS];
    v[fnv1a(word) as usize % FAKE_DIMENSIONS] = 1.0;
    v
}

/// Bag-of-words embedder: texts sharing words get similar vectors.
#[derive(Default)]
pub struct FakeEmbedder {
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn embed_now(text: &str, representations: Representations) -> Embedding {
        let tokens = words(text);

        let dense = representations.dense.then(|| {
            let mut v = vec![0.0; FAKE_DIMENSIONS];
            for token in &tokens {
                v[fnv1a(token) as usize % FAKE_DIMENSIONS] += 1.0;
            }
            v
        });
        let sparse = representations.sparse.then(|| {
            let mut ids: Vec<u32> = tokens.iter().map(|t| fnv1a(t) % 10_000).collect();
            ids.sort_unstable();
            ids.dedup();
            SparseVector::from_weights(ids.into_iter().map(|id| (id, 1.0)))
        });
        let multivector = representations
            .multivector
            .then(|| tokens.iter().map(|t| one_hot(t)).collect());

        Embedding {
            dense,
            sparse,
            multivector,
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str, representations: Representations) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::embed_now(text, representations))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        representations: Representations,
    ) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| Self::embed_now(t, representations))
            .collect())
    }

    fn dimensions(&self) -> usize {
        FAKE_DIMENSIONS
    }
}

/// Scores a document by how many distinct query words it contains.
pub struct KeywordCrossEncoder;

#[async_trait]
impl CrossEncoder for KeywordCrossEncoder {
    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<RankedDocument>> {
        let mut query_words = words(query);
        query_words.sort();
        query_words.dedup();

        let mut ranked: Vec<RankedDocument> = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let doc_words = words(doc);
                let hits = query_words.iter().filter(|w| doc_words.contains(w)).count();
                RankedDocument {
                    index,
                    score: hits as f32,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }

    fn model(&self) -> &str {
        "keyword"
    }
}
