//! Embedding generation for lecture passages and queries.
//!
//! One passage can be represented three ways: a dense vector, a sparse
//! lexical-weight vector and a multi-vector (one vector per token). Callers
//! ask only for the representations they need.

mod bge;
mod openai;

pub use bge::BgeM3Embedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{MampfError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which representations an embedding call should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Representations {
    pub dense: bool,
    pub sparse: bool,
    pub multivector: bool,
}

impl Representations {
    pub const DENSE: Self = Self {
        dense: true,
        sparse: false,
        multivector: false,
    };
    pub const HYBRID: Self = Self {
        dense: true,
        sparse: true,
        multivector: false,
    };
    pub const ALL: Self = Self {
        dense: true,
        sparse: true,
        multivector: true,
    };
}

/// Token-id to weight mapping in index format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Build from token weights, keeping only strictly positive weights.
    pub fn from_weights(weights: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let mut vector = SparseVector::default();
        for (index, value) in weights {
            if value > 0.0 {
                vector.indices.push(index);
                vector.values.push(value);
            }
        }
        vector
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Dot product over shared indices.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let mut sum = 0.0;
        for (i, index) in self.indices.iter().enumerate() {
            if let Some(j) = other.indices.iter().position(|o| o == index) {
                sum += self.values[i] * other.values[j];
            }
        }
        sum
    }
}

/// The representations returned for one text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub dense: Option<Vec<f32>>,
    pub sparse: Option<SparseVector>,
    pub multivector: Option<Vec<Vec<f32>>>,
}

impl Embedding {
    pub fn dense(&self) -> Result<&[f32]> {
        self.dense
            .as_deref()
            .ok_or_else(|| MampfError::Embedding("Dense vector missing from embedding".to_string()))
    }

    pub fn sparse(&self) -> Result<&SparseVector> {
        self.sparse
            .as_ref()
            .ok_or_else(|| MampfError::Embedding("Sparse vector missing from embedding".to_string()))
    }

    pub fn multivector(&self) -> Result<&[Vec<f32>]> {
        self.multivector
            .as_deref()
            .ok_or_else(|| MampfError::Embedding("Multi-vector missing from embedding".to_string()))
    }
}

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str, representations: Representations) -> Result<Embedding>;

    /// Embed many texts, preserving input order.
    async fn embed_batch(
        &self,
        texts: &[String],
        representations: Representations,
    ) -> Result<Vec<Embedding>>;

    /// Dense embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in the settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::BgeM3 => Ok(Arc::new(BgeM3Embedder::from_settings(settings)?)),
        EmbeddingProvider::Openai => Ok(Arc::new(OpenAIEmbedder::from_settings(settings)?)),
    }
}
