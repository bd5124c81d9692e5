//! Vector index abstraction for lecture passages.
//!
//! A collection stores points with up to three named vector fields:
//! `dense` (cosine), `sparse` (dot product over shared token ids) and
//! `colbert` (multi-vector, MaxSim). Backends only store points; ranking is
//! shared in [`scoring`].

mod memory;
pub mod scoring;
mod sqlite;

pub use memory::MemoryVectorIndex;
pub use sqlite::SqliteVectorIndex;

use crate::chunking::Chunk;
use crate::config::Settings;
use crate::embedding::{Embedding, SparseVector};
use crate::error::{MampfError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Field names, as reported by `collection_info`.
pub const DENSE_FIELD: &str = "dense";
pub const SPARSE_FIELD: &str = "sparse";
pub const COLBERT_FIELD: &str = "colbert";

/// Reciprocal rank fusion constant.
pub const RRF_K: f32 = 60.0;

/// A stored passage with its vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: Uuid,
    pub dense: Vec<f32>,
    pub sparse: Option<SparseVector>,
    pub colbert: Option<Vec<Vec<f32>>>,
    pub payload: Chunk,
}

impl Point {
    /// Build a point with a fresh id from a chunk and its embedding.
    pub fn new(payload: Chunk, embedding: Embedding) -> Result<Self> {
        let dense = embedding
            .dense
            .ok_or_else(|| MampfError::Embedding("Dense vector required for indexing".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            dense,
            sparse: embedding.sparse,
            colbert: embedding.multivector,
            payload,
        })
    }
}

/// A query result with score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: Uuid,
    /// Higher is better.
    pub score: f32,
    pub payload: Chunk,
}

/// How to rank the points of a collection.
#[derive(Debug, Clone)]
pub enum Query {
    /// Nearest neighbours on the dense field.
    Dense { dense: Vec<f32> },
    /// Dense and sparse prefetch fused with reciprocal rank fusion.
    Fusion {
        dense: Vec<f32>,
        sparse: SparseVector,
        prefetch_limit: usize,
    },
    /// Dense and sparse prefetch, rescored by MaxSim on the colbert field.
    FusionRerank {
        dense: Vec<f32>,
        sparse: SparseVector,
        colbert: Vec<Vec<f32>>,
        prefetch_limit: usize,
    },
}

/// Vector field configuration of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Size of dense vectors and of each colbert token vector.
    pub dense_dimension: usize,
}

impl CollectionSpec {
    pub fn new(dense_dimension: usize) -> Self {
        Self { dense_dimension }
    }

    /// Reject points whose vectors do not fit this collection.
    pub fn validate(&self, point: &Point) -> Result<()> {
        if point.dense.len() != self.dense_dimension {
            return Err(MampfError::InvalidInput(format!(
                "Dense vector of point {} has {} dimensions, collection expects {}",
                point.id,
                point.dense.len(),
                self.dense_dimension
            )));
        }
        if let Some(colbert) = &point.colbert {
            if let Some(token) = colbert.iter().find(|t| t.len() != self.dense_dimension) {
                return Err(MampfError::InvalidInput(format!(
                    "Colbert vector of point {} has {} dimensions, collection expects {}",
                    point.id,
                    token.len(),
                    self.dense_dimension
                )));
            }
        }
        Ok(())
    }
}

/// Summary information about a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub points: usize,
    pub dense_dimension: usize,
    pub fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create an empty collection; fails if it already exists.
    async fn create_collection(&self, name: &str, spec: &CollectionSpec) -> Result<()>;

    /// Delete a collection and its points; `IndexNotFound` if missing.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo>;

    /// Insert or replace points by id. Returns the number written.
    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<usize>;

    /// Rank the collection's points, best first, at most `limit`.
    async fn query(&self, collection: &str, query: &Query, limit: usize) -> Result<Vec<ScoredPoint>>;
}

/// Create the vector index selected in the settings.
pub fn create_vector_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
    match settings.vector_store.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorIndex::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorIndex::new())),
        other => Err(MampfError::InvalidConfiguration(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

fn collection_fields() -> Vec<String> {
    vec![
        DENSE_FIELD.to_string(),
        SPARSE_FIELD.to_string(),
        COLBERT_FIELD.to_string(),
    ]
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
