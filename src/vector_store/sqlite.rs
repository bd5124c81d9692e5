//! SQLite-based vector index implementation.
//!
//! Vectors are stored as little-endian `f32` blobs and ranked in Rust. For
//! large corpora, point the pipeline at a dedicated vector database instead.

use super::{
    collection_fields, scoring, CollectionInfo, CollectionSpec, Point, Query, ScoredPoint,
    VectorIndex,
};
use crate::chunking::Chunk;
use crate::embedding::SparseVector;
use crate::error::{MampfError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY,
        dense_dimension INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS points (
        collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
        id TEXT NOT NULL,
        payload TEXT NOT NULL,
        dense BLOB NOT NULL,
        sparse TEXT,
        colbert BLOB,
        PRIMARY KEY (collection, id)
    );
"#;

/// SQLite-based vector index.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    /// Open (or create) an index database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn).inspect(|_| info!("Initialized SQLite vector index at {:?}", path))
    }

    /// Create an in-memory SQLite index (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MampfError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize vectors to bytes.
    fn vectors_to_bytes<'a>(vectors: impl IntoIterator<Item = &'a Vec<f32>>) -> Vec<u8> {
        vectors
            .into_iter()
            .flat_map(|v| v.iter().flat_map(|f| f.to_le_bytes()))
            .collect()
    }

    /// Deserialize a flat vector from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn spec(conn: &Connection, name: &str) -> Result<CollectionSpec> {
        conn.query_row(
            "SELECT dense_dimension FROM collections WHERE name = ?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .map(|dimension| CollectionSpec::new(dimension as usize))
        .ok_or_else(|| MampfError::IndexNotFound(name.to_string()))
    }

    fn load_points(conn: &Connection, collection: &str, spec: &CollectionSpec) -> Result<Vec<Point>> {
        let mut stmt = conn.prepare(
            "SELECT id, payload, dense, sparse, colbert FROM points WHERE collection = ?1 ORDER BY rowid",
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<Vec<u8>>>(4)?,
            ))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (id, payload, dense, sparse, colbert) = row?;
            let id = Uuid::parse_str(&id)
                .map_err(|e| MampfError::VectorStore(format!("Invalid point id {}: {}", id, e)))?;
            let payload: Chunk = serde_json::from_str(&payload)?;
            let sparse: Option<SparseVector> = sparse.map(|s| serde_json::from_str(&s)).transpose()?;
            let colbert = colbert.map(|bytes| {
                Self::bytes_to_embedding(&bytes)
                    .chunks(spec.dense_dimension.max(1))
                    .map(|token| token.to_vec())
                    .collect()
            });

            points.push(Point {
                id,
                dense: Self::bytes_to_embedding(&dense),
                sparse,
                colbert,
                payload,
            });
        }

        Ok(points)
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self, spec))]
    async fn create_collection(&self, name: &str, spec: &CollectionSpec) -> Result<()> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO collections (name, dense_dimension, created_at) VALUES (?1, ?2, ?3)",
            params![name, spec.dense_dimension as i64, Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            return Err(MampfError::VectorStore(format!("Collection already exists: {}", name)));
        }
        info!("Created collection {} ({} dimensions)", name, spec.dense_dimension);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM points WHERE collection = ?1", params![name])?;
        let deleted = tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        if deleted == 0 {
            return Err(MampfError::IndexNotFound(name.to_string()));
        }
        tx.commit()?;
        info!("Deleted collection {}", name);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let conn = self.lock()?;
        let (dimension, created_at): (i64, String) = conn
            .query_row(
                "SELECT dense_dimension, created_at FROM collections WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| MampfError::IndexNotFound(name.to_string()))?;

        let points: i64 = conn.query_row(
            "SELECT COUNT(*) FROM points WHERE collection = ?1",
            params![name],
            |row| row.get(0),
        )?;

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MampfError::VectorStore(format!("Invalid creation time: {}", e)))?;

        Ok(CollectionInfo {
            name: name.to_string(),
            points: points as usize,
            dense_dimension: dimension as usize,
            fields: collection_fields(),
            created_at,
        })
    }

    #[instrument(skip(self, points), fields(count = points.len()))]
    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<usize> {
        let conn = self.lock()?;
        let spec = Self::spec(&conn, collection)?;
        for point in points {
            spec.validate(point)?;
        }

        let tx = conn.unchecked_transaction()?;
        for point in points {
            let sparse = point.sparse.as_ref().map(serde_json::to_string).transpose()?;
            let colbert = point.colbert.as_ref().map(|c| Self::vectors_to_bytes(c));

            tx.execute(
                r#"
                INSERT INTO points (collection, id, payload, dense, sparse, colbert)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(collection, id) DO UPDATE SET
                    payload = excluded.payload,
                    dense = excluded.dense,
                    sparse = excluded.sparse,
                    colbert = excluded.colbert
                "#,
                params![
                    collection,
                    point.id.to_string(),
                    serde_json::to_string(&point.payload)?,
                    Self::vectors_to_bytes([&point.dense]),
                    sparse,
                    colbert,
                ],
            )?;
        }
        tx.commit()?;

        debug!("Upserted {} points into {}", points.len(), collection);
        Ok(points.len())
    }

    #[instrument(skip(self, query))]
    async fn query(&self, collection: &str, query: &Query, limit: usize) -> Result<Vec<ScoredPoint>> {
        let conn = self.lock()?;
        let spec = Self::spec(&conn, collection)?;
        let points = Self::load_points(&conn, collection, &spec)?;
        debug!("Ranking {} points in {}", points.len(), collection);
        Ok(scoring::execute_query(&points, query, limit))
    }
}
