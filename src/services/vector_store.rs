// ABOUTME: Persistent knowledge index over sqlite-vec for support passages.
// ABOUTME: Validates embedding-model compatibility before serving any search.

use rusqlite::{ffi::sqlite3_auto_extension, params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use thiserror::Error;

/// Collection identifier shared by the ingest and query binaries. Stamped
/// into the index metadata and checked when the index is opened.
pub const COLLECTION_ID: &str = "techgear_products";

/// Ensure sqlite-vec is loaded only once.
static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension globally. Runs before the first
/// connection is opened; later calls are no-ops.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| {
        unsafe {
            sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
    });
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Knowledge database not found at {0}")]
    Missing(PathBuf),
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Index was built with embedding model {stored}, but {active} is configured")]
    ModelMismatch { stored: String, active: String },
    #[error("Index belongs to collection {stored}, expected {expected}")]
    CollectionMismatch { stored: String, expected: String },
}

/// A stored support passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: i64,
    pub source: String,
    pub seq: i64,
    pub content: String,
    pub source_hash: String,
    pub indexed_at: i64,
}

/// A similarity search hit. Lower distance means more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub passage: Passage,
    pub distance: f32,
}

/// Index statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_passages: i64,
    pub total_sources: i64,
    pub last_indexed: Option<i64>,
}

/// Handle to the persisted knowledge index. Cheap to clone; every operation
/// opens its own connection, so a handle can be shared across tasks.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: PathBuf,
    embedding_model: String,
    dim: usize,
}

impl KnowledgeStore {
    /// Create (or reopen) the index for the given embedding model and stamp
    /// the compatibility metadata. An existing index stamped for a different
    /// collection, model, or dimensionality is rebuilt from scratch.
    /// Ingest-time entrypoint.
    pub fn create(path: &Path, embedding_model: &str, dim: usize) -> Result<Self, StoreError> {
        init_sqlite_vec();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(path)?;

        // Verify sqlite-vec is loaded
        let _version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS index_metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        // Re-stamping an incompatible index would leave it serving vectors
        // from the old model. Drop its data tables; the vec0 table is bound
        // to one dimensionality and has to be recreated, not just emptied.
        if let Some((collection, model, stored_dim)) = stored_fingerprint(&conn) {
            if collection != COLLECTION_ID || model != embedding_model || stored_dim != dim {
                log::warn!(
                    "[VectorStore] Index at {} was built with {} ({} dims), rebuilding for {} ({} dims)",
                    path.display(),
                    model,
                    stored_dim,
                    embedding_model,
                    dim
                );
                conn.execute("DROP TABLE IF EXISTS passage_embeddings", [])?;
                conn.execute("DROP TABLE IF EXISTS passages", [])?;
            }
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS passages (
                id INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                seq INTEGER NOT NULL,
                content TEXT NOT NULL,
                source_hash TEXT NOT NULL,
                indexed_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_passages_source ON passages(source)",
            [],
        )?;

        conn.execute(
            &format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS passage_embeddings USING vec0(
                    passage_id INTEGER PRIMARY KEY,
                    embedding float[{}]
                )",
                dim
            ),
            [],
        )?;

        set_metadata(&conn, "collection", COLLECTION_ID)?;
        set_metadata(&conn, "embedding_model", embedding_model)?;
        set_metadata(&conn, "embedding_dim", &dim.to_string())?;
        set_metadata(&conn, "built_at", &jiff::Timestamp::now().to_string())?;

        Ok(Self {
            path: path.to_path_buf(),
            embedding_model: embedding_model.to_string(),
            dim,
        })
    }

    /// Open an existing index for querying. Fails when the index is absent
    /// or was built for a different collection, embedding model, or
    /// dimensionality than the one configured now.
    pub fn open(path: &Path, embedding_model: &str, dim: usize) -> Result<Self, StoreError> {
        init_sqlite_vec();

        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;

        let collection = get_metadata(&conn, "collection").unwrap_or_default();
        if collection != COLLECTION_ID {
            return Err(StoreError::CollectionMismatch {
                stored: collection,
                expected: COLLECTION_ID.to_string(),
            });
        }

        let stored_model = get_metadata(&conn, "embedding_model").unwrap_or_default();
        if stored_model != embedding_model {
            return Err(StoreError::ModelMismatch {
                stored: stored_model,
                active: embedding_model.to_string(),
            });
        }

        let stored_dim: usize = get_metadata(&conn, "embedding_dim")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        if stored_dim != dim {
            return Err(StoreError::DimensionMismatch {
                expected: dim,
                actual: stored_dim,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            embedding_model: embedding_model.to_string(),
            dim,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Insert a passage with its embedding. Returns the new passage id.
    pub fn insert_passage(
        &self,
        source: &str,
        seq: i64,
        content: &str,
        source_hash: &str,
        embedding: &[f32],
    ) -> Result<i64, StoreError> {
        if embedding.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: embedding.len(),
            });
        }

        let conn = self.connect()?;
        let now = jiff::Timestamp::now().as_millisecond();

        conn.execute(
            "INSERT INTO passages (source, seq, content, source_hash, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![source, seq, content, source_hash, now],
        )?;

        let passage_id = conn.last_insert_rowid();

        let embedding_blob = embedding_to_blob(embedding);
        conn.execute(
            "INSERT INTO passage_embeddings (passage_id, embedding) VALUES (?1, ?2)",
            params![passage_id, embedding_blob],
        )?;

        Ok(passage_id)
    }

    /// Search for the passages most similar to the query embedding, most
    /// similar first. An empty index yields an empty list.
    pub fn search_similar(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        if query_embedding.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: query_embedding.len(),
            });
        }

        let conn = self.connect()?;
        let embedding_blob = embedding_to_blob(query_embedding);

        // vec0 reads k from the WHERE clause; a bound LIMIT is not visible
        // to its KNN planner.
        let mut stmt = conn.prepare(
            "SELECT
                p.id, p.source, p.seq, p.content, p.source_hash, p.indexed_at,
                e.distance
             FROM passage_embeddings e
             JOIN passages p ON p.id = e.passage_id
             WHERE e.embedding MATCH ?1 AND k = ?2
             ORDER BY e.distance",
        )?;

        let results = stmt
            .query_map(params![embedding_blob, limit as i64], |row| {
                Ok(SearchResult {
                    passage: Passage {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        seq: row.get(2)?,
                        content: row.get(3)?,
                        source_hash: row.get(4)?,
                        indexed_at: row.get(5)?,
                    },
                    distance: row.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(results)
    }

    /// Delete all passages for a source (used before re-ingesting it).
    pub fn delete_source(&self, source: &str) -> Result<usize, StoreError> {
        let conn = self.connect()?;

        // Get passage IDs first
        let mut stmt = conn.prepare("SELECT id FROM passages WHERE source = ?1")?;
        let passage_ids: Vec<i64> = stmt
            .query_map(params![source], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        // Delete embeddings
        for passage_id in &passage_ids {
            conn.execute(
                "DELETE FROM passage_embeddings WHERE passage_id = ?1",
                params![passage_id],
            )?;
        }

        // Delete passages
        let deleted = conn.execute("DELETE FROM passages WHERE source = ?1", params![source])?;

        Ok(deleted)
    }

    /// Remove every passage and embedding. Used by full rebuilds.
    pub fn clear(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM passage_embeddings", [])?;
        conn.execute("DELETE FROM passages", [])?;
        Ok(())
    }

    /// Check if a source needs re-ingesting by comparing content hashes.
    pub fn source_needs_reindex(
        &self,
        source: &str,
        current_hash: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.connect()?;

        let stored_hash: Option<String> = conn
            .query_row(
                "SELECT source_hash FROM passages WHERE source = ?1 LIMIT 1",
                params![source],
                |row| row.get(0),
            )
            .ok();

        Ok(stored_hash.as_deref() != Some(current_hash))
    }

    /// Get index statistics.
    pub fn stats(&self) -> Result<IndexStats, StoreError> {
        let conn = self.connect()?;

        let total_passages: i64 =
            conn.query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))?;

        let total_sources: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT source) FROM passages",
            [],
            |row| row.get(0),
        )?;

        let last_indexed: Option<i64> = conn
            .query_row("SELECT MAX(indexed_at) FROM passages", [], |row| row.get(0))
            .ok();

        Ok(IndexStats {
            total_passages,
            total_sources,
            last_indexed,
        })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        init_sqlite_vec();
        Ok(Connection::open(&self.path)?)
    }
}

fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO index_metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT value FROM index_metadata WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .ok()
}

/// The compatibility triple stamped into an index, or None for a fresh one.
fn stored_fingerprint(conn: &Connection) -> Option<(String, String, usize)> {
    let collection = get_metadata(conn, "collection")?;
    let model = get_metadata(conn, "embedding_model")?;
    let dim = get_metadata(conn, "embedding_dim")?.parse().ok()?;
    Some((collection, model, dim))
}

/// Convert f32 embedding to blob for storage.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding
        .iter()
        .flat_map(|f| f.to_le_bytes())
        .collect()
}
