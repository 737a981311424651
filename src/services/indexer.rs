// ABOUTME: Document discovery and ingest orchestration for the knowledge index.
// ABOUTME: Walks a docs directory and coordinates chunking, embedding, storage.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::orchestrator::model::{EmbeddingModel, ModelError};
use crate::services::chunker::TextSplitter;
use crate::services::vector_store::{KnowledgeStore, StoreError};

/// File extensions treated as knowledge documents.
const KNOWLEDGE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Passages sent per embedding request.
const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Embedding failed: {0}")]
    Embedding(#[from] ModelError),
    #[error("Knowledge store failure: {0}")]
    Store(#[from] StoreError),
}

/// Summary of one ingest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub files_seen: usize,
    pub files_skipped: usize,
    pub passages_written: usize,
}

/// Discover knowledge documents under a path, in a stable order.
/// A single file is returned as-is when it qualifies.
pub fn discover_documents(path: &Path) -> Vec<PathBuf> {
    let mut documents = Vec::new();
    if path.is_file() {
        if is_knowledge_document(path) {
            documents.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        collect_documents(path, &mut documents);
        documents.sort();
    }
    documents
}

fn collect_documents(current: &Path, documents: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(current) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_documents(&path, documents);
        } else if path.is_file() && is_knowledge_document(&path) {
            documents.push(path);
        }
    }
}

fn is_knowledge_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| KNOWLEDGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Compute a hash of document content for change detection.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Splits documents into passages, embeds them, and writes them to the
/// knowledge store. Unchanged documents are skipped by content hash.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingModel>,
    store: KnowledgeStore,
    splitter: TextSplitter,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, store: KnowledgeStore) -> Self {
        Self {
            embedder,
            store,
            splitter: TextSplitter::default(),
        }
    }

    /// Ingest every knowledge document under `path`.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, IngestError> {
        let documents = discover_documents(path);
        if documents.is_empty() {
            log::warn!("[Ingest] No knowledge documents found at {}", path.display());
        }

        let mut report = IngestReport::default();
        for document in &documents {
            report.files_seen += 1;
            match self.ingest_document(document).await? {
                Some(count) => report.passages_written += count,
                None => report.files_skipped += 1,
            }
        }

        log::info!(
            "[Ingest] {} files seen, {} skipped, {} passages written",
            report.files_seen,
            report.files_skipped,
            report.passages_written
        );
        Ok(report)
    }

    /// Ingest one document. Returns the passage count, or `None` when the
    /// document is unchanged since the last run.
    async fn ingest_document(&self, path: &Path) -> Result<Option<usize>, IngestError> {
        let content = fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = path.display().to_string();
        let hash = compute_hash(&content);

        if !self.store.source_needs_reindex(&source, &hash)? {
            log::info!("[Ingest] {} is unchanged, skipping", source);
            return Ok(None);
        }

        // Stale passages from an earlier version of this document go first.
        self.store.delete_source(&source)?;

        let chunks = self.splitter.split(&content);
        let mut written = 0usize;
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let embeddings = self.embedder.embed_batch(batch).await?;
            for (text, embedding) in batch.iter().zip(embeddings.iter()) {
                self.store
                    .insert_passage(&source, written as i64, text, &hash, embedding)?;
                written += 1;
            }
        }

        log::info!("[Ingest] Indexed {} into {} passages", source, written);
        Ok(Some(written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::model::mock::FixedEmbedding;

    const DIM: usize = 4;

    fn test_store(dir: &tempfile::TempDir) -> KnowledgeStore {
        KnowledgeStore::create(&dir.path().join("knowledge.db"), "embedding-001", DIM).unwrap()
    }

    #[test]
    fn test_compute_hash() {
        let hash1 = compute_hash("hello world");
        let hash2 = compute_hash("hello world");
        let hash3 = compute_hash("different content");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_is_knowledge_document() {
        assert!(is_knowledge_document(Path::new("product_info.txt")));
        assert!(is_knowledge_document(Path::new("faq.md")));
        assert!(is_knowledge_document(Path::new("NOTES.TXT")));
        assert!(!is_knowledge_document(Path::new("catalog.pdf")));
        assert!(!is_knowledge_document(Path::new("Makefile")));
    }

    #[test]
    fn test_discover_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "beta").unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("c.pdf"), "gamma").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/d.txt"), "delta").unwrap();

        let documents = discover_documents(dir.path());
        let names: Vec<String> = documents
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md", "sub/d.txt"]);
    }

    #[test]
    fn test_discover_documents_accepts_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("info.txt");
        fs::write(&file, "content").unwrap();

        assert_eq!(discover_documents(&file), vec![file]);
        assert!(discover_documents(&dir.path().join("missing.txt")).is_empty());
    }

    #[tokio::test]
    async fn test_ingest_writes_passages_and_skips_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("info.txt"), "TechGear sells gadgets.").unwrap();

        let store = test_store(&dir);
        let indexer = Indexer::new(Arc::new(FixedEmbedding::new(DIM)), store.clone());

        let report = indexer.ingest(&docs).await.unwrap();
        assert_eq!(report.files_seen, 1);
        assert_eq!(report.files_skipped, 0);
        assert_eq!(report.passages_written, 1);

        // Unchanged on the second run.
        let report = indexer.ingest(&docs).await.unwrap();
        assert_eq!(report.files_seen, 1);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.passages_written, 0);
    }

    #[tokio::test]
    async fn test_reingest_replaces_stale_passages() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        let file = docs.join("info.txt");
        fs::write(&file, "version one").unwrap();

        let store = test_store(&dir);
        let indexer = Indexer::new(Arc::new(FixedEmbedding::new(DIM)), store.clone());
        indexer.ingest(&docs).await.unwrap();

        fs::write(&file, "version two").unwrap();
        indexer.ingest(&docs).await.unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_passages, 1);

        let hits = store.search_similar(&[1.0, 0.0, 0.0, 0.0], 4).unwrap();
        assert_eq!(hits[0].passage.content, "version two");
    }

    #[tokio::test]
    async fn test_ingest_of_an_empty_directory_reports_zeroes() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();

        let store = test_store(&dir);
        let indexer = Indexer::new(Arc::new(FixedEmbedding::new(DIM)), store);

        let report = indexer.ingest(&docs).await.unwrap();
        assert_eq!(report.files_seen, 0);
        assert_eq!(report.passages_written, 0);
    }
}
