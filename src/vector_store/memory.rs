//! In-memory vector index implementation.
//!
//! Useful for testing and scratch benchmark runs.

use super::{
    collection_fields, scoring, CollectionInfo, CollectionSpec, Point, Query, ScoredPoint,
    VectorIndex,
};
use crate::error::{MampfError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

struct MemoryCollection {
    spec: CollectionSpec,
    created_at: DateTime<Utc>,
    /// Insertion order is the tie-break order for queries.
    points: Vec<Point>,
}

/// In-memory vector index.
pub struct MemoryVectorIndex {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryVectorIndex {
    /// Create a new in-memory vector index.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error<T>(e: PoisonError<T>) -> MampfError {
    MampfError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.collections.read().map_err(lock_error)?;
        Ok(collections.contains_key(name))
    }

    async fn create_collection(&self, name: &str, spec: &CollectionSpec) -> Result<()> {
        let mut collections = self.collections.write().map_err(lock_error)?;
        if collections.contains_key(name) {
            return Err(MampfError::VectorStore(format!("Collection already exists: {}", name)));
        }
        collections.insert(
            name.to_string(),
            MemoryCollection {
                spec: *spec,
                created_at: Utc::now(),
                points: Vec::new(),
            },
        );
        debug!("Created in-memory collection {}", name);
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(lock_error)?;
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MampfError::IndexNotFound(name.to_string()))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().map_err(lock_error)?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let collections = self.collections.read().map_err(lock_error)?;
        let collection = collections
            .get(name)
            .ok_or_else(|| MampfError::IndexNotFound(name.to_string()))?;

        Ok(CollectionInfo {
            name: name.to_string(),
            points: collection.points.len(),
            dense_dimension: collection.spec.dense_dimension,
            fields: collection_fields(),
            created_at: collection.created_at,
        })
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<usize> {
        let mut collections = self.collections.write().map_err(lock_error)?;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| MampfError::IndexNotFound(collection.to_string()))?;

        for point in points {
            target.spec.validate(point)?;
        }

        for point in points {
            match target.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point.clone(),
                None => target.points.push(point.clone()),
            }
        }

        debug!("Upserted {} points into {}", points.len(), collection);
        Ok(points.len())
    }

    async fn query(&self, collection: &str, query: &Query, limit: usize) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().map_err(lock_error)?;
        let target = collections
            .get(collection)
            .ok_or_else(|| MampfError::IndexNotFound(collection.to_string()))?;

        Ok(scoring::execute_query(&target.points, query, limit))
    }
}
