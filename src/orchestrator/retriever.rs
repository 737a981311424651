// ABOUTME: Retrieves the support passages most similar to a customer query.
// ABOUTME: Embeds the query, then searches the knowledge store off the runtime.

use std::sync::Arc;

use super::model::EmbeddingModel;
use super::types::WorkflowError;
use crate::services::vector_store::KnowledgeStore;

/// Number of passages retrieved per query.
pub const DEFAULT_TOP_K: usize = 4;

/// One retrieved passage, ready for prompt assembly.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    pub text: String,
    pub distance: f32,
}

/// Similarity retrieval over the knowledge store.
pub struct ContextRetriever {
    embedder: Arc<dyn EmbeddingModel>,
    store: KnowledgeStore,
}

impl ContextRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, store: KnowledgeStore) -> Self {
        Self { embedder, store }
    }

    /// Retrieve up to `k` passages most similar to the query, most similar
    /// first. An empty index yields an empty list, not an error.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, WorkflowError> {
        let query_embedding = self.embedder.embed(query).await?;

        // The store is blocking rusqlite; keep it off the async runtime.
        let store = self.store.clone();
        let hits = tokio::task::spawn_blocking(move || store.search_similar(&query_embedding, k))
            .await
            .map_err(|e| WorkflowError::Internal(format!("Search task failed: {}", e)))??;

        log::info!(
            "[Retriever] Retrieved {} passages for query ({} requested)",
            hits.len(),
            k
        );

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedPassage {
                text: hit.passage.content,
                distance: hit.distance,
            })
            .collect())
    }
}
