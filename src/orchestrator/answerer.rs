// ABOUTME: Retrieval-augmented answer generation for support queries.
// ABOUTME: Joins retrieved passages into the support prompt and calls the model.

use std::sync::Arc;

use super::model::GenerationModel;
use super::prompts;
use super::retriever::{ContextRetriever, DEFAULT_TOP_K};
use super::types::WorkflowError;

/// Sampling temperature for answer generation.
pub const ANSWER_TEMPERATURE: f32 = 0.3;

/// Output cap for answer generation.
pub const ANSWER_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Separator between passages in the assembled context block.
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Generates grounded answers from retrieved context.
pub struct AnswerGenerator {
    model: Arc<dyn GenerationModel>,
    retriever: ContextRetriever,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn GenerationModel>, retriever: ContextRetriever) -> Self {
        Self { model, retriever }
    }

    /// Answer a query from retrieved context. An empty index is not an
    /// error; the model answers from the prompt guidelines alone.
    pub async fn answer(&self, query: &str) -> Result<String, WorkflowError> {
        let passages = self.retriever.retrieve(query, DEFAULT_TOP_K).await?;
        if passages.is_empty() {
            log::warn!("[Answerer] No passages retrieved, answering without context");
        }

        let context = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR);
        let prompt = prompts::render_support_prompt(&context, query);

        let response = self
            .model
            .generate(&prompt, ANSWER_TEMPERATURE, ANSWER_MAX_OUTPUT_TOKENS)
            .await?;

        log::info!("[Answerer] Generated response ({} chars)", response.len());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::mock::{FailingModel, FixedEmbedding, ScriptedModel};
    use super::*;
    use crate::services::vector_store::KnowledgeStore;

    const DIM: usize = 4;

    fn test_store() -> (tempfile::TempDir, KnowledgeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            KnowledgeStore::create(&dir.path().join("knowledge.db"), "embedding-001", DIM)
                .unwrap();
        (dir, store)
    }

    fn test_answerer(
        store: KnowledgeStore,
        responses: &[&str],
    ) -> (Arc<ScriptedModel>, AnswerGenerator) {
        let model = Arc::new(ScriptedModel::new(responses));
        let retriever = ContextRetriever::new(Arc::new(FixedEmbedding::new(DIM)), store);
        let generator = AnswerGenerator::new(model.clone(), retriever);
        (model, generator)
    }

    #[tokio::test]
    async fn joins_passages_in_similarity_order_with_the_separator() {
        let (_dir, store) = test_store();
        store
            .insert_passage("doc.txt", 0, "SmartWatch Pro X: $299", "h", &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        store
            .insert_passage("doc.txt", 1, "Battery life: 48 hours", "h", &[0.0, 1.0, 0.0, 0.0])
            .unwrap();

        let (model, generator) = test_answerer(store, &["It costs $299."]);
        let answer = generator.answer("How much is the SmartWatch?").await.unwrap();
        assert_eq!(answer, "It costs $299.");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0]
            .prompt
            .contains("SmartWatch Pro X: $299\n\n---\n\nBattery life: 48 hours"));
        assert!(calls[0].prompt.contains("Customer Query: How much is the SmartWatch?"));
        assert_eq!(calls[0].temperature, ANSWER_TEMPERATURE);
        assert_eq!(calls[0].max_output_tokens, ANSWER_MAX_OUTPUT_TOKENS);
    }

    #[tokio::test]
    async fn empty_index_still_answers() {
        let (_dir, store) = test_store();
        let (model, generator) = test_answerer(store, &["Our store hours are 9 to 5."]);

        let answer = generator.answer("When are you open?").await.unwrap();
        assert_eq!(answer, "Our store hours are 9 to 5.");

        let calls = model.calls();
        assert!(calls[0]
            .prompt
            .contains("Context from knowledge base:\n\n\nCustomer Query: When are you open?"));
    }

    #[tokio::test]
    async fn retrieves_at_most_four_passages() {
        let (_dir, store) = test_store();
        for seq in 0..6 {
            let mut embedding = [0.0; DIM];
            embedding[seq % DIM] = 1.0 + seq as f32;
            store
                .insert_passage("doc.txt", seq as i64, &format!("passage {}", seq), "h", &embedding)
                .unwrap();
        }

        let (model, generator) = test_answerer(store, &["ok"]);
        generator.answer("query").await.unwrap();

        // Four passages are joined by three separators.
        let calls = model.calls();
        assert_eq!(calls[0].prompt.matches(PASSAGE_SEPARATOR).count(), 3);
    }

    #[tokio::test]
    async fn generation_errors_propagate() {
        let (_dir, store) = test_store();
        let retriever = ContextRetriever::new(Arc::new(FixedEmbedding::new(DIM)), store);
        let generator = AnswerGenerator::new(Arc::new(FailingModel), retriever);

        let err = generator.answer("query").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Model(_)));
    }
}
