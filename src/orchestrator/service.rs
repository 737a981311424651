// ABOUTME: Workflow service that ties classifier, router, and responders together.
// ABOUTME: Provides the process() entry point called by the agent binary.

use std::sync::Arc;

use uuid::Uuid;

use super::answerer::AnswerGenerator;
use super::classifier::QueryClassifier;
use super::escalation;
use super::model::{EmbeddingModel, GenerationModel};
use super::retriever::ContextRetriever;
use super::router::{self, Route};
use super::types::{QueryResponse, WorkflowError, WorkflowState};
use crate::services::vector_store::KnowledgeStore;

/// The support workflow: classify, route, respond.
///
/// Holds no per-query state. Call `new` once at startup and share the
/// instance across queries.
pub struct SupportWorkflow {
    classifier: QueryClassifier,
    answerer: AnswerGenerator,
}

impl SupportWorkflow {
    pub fn new(
        model: Arc<dyn GenerationModel>,
        embedder: Arc<dyn EmbeddingModel>,
        store: KnowledgeStore,
    ) -> Self {
        let retriever = ContextRetriever::new(embedder, store);
        Self {
            classifier: QueryClassifier::new(model.clone()),
            answerer: AnswerGenerator::new(model, retriever),
        }
    }

    /// Run one query through the full workflow.
    ///
    /// Exactly one responder runs per invocation. Any failure after
    /// classification aborts the whole invocation; there is no partial
    /// response.
    pub async fn process(&self, query: &str) -> Result<QueryResponse, WorkflowError> {
        let invocation_id = Uuid::new_v4();
        log::info!(
            "[Workflow] ({}) Processing query ({} chars)",
            invocation_id,
            query.len()
        );

        // 1. Classify the query
        let state = WorkflowState::start(query);
        let category = self.classifier.classify(state.query()).await?;
        let state = state.classified(category);

        // 2. Route and run exactly one responder
        let response = match router::route(state.category()) {
            Route::Answer => {
                log::info!("[Workflow] ({}) Routed to answer generation", invocation_id);
                self.answerer.answer(state.query()).await?
            }
            Route::Escalate => {
                log::info!("[Workflow] ({}) Routed to escalation", invocation_id);
                escalation::escalation_response().to_string()
            }
        };

        // 3. Finalize
        let result = state.responded(response);
        log::info!(
            "[Workflow] ({}) Done: category={}, needs_escalation={}",
            invocation_id,
            result.category,
            result.needs_escalation
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::mock::{FailingModel, FixedEmbedding, ScriptedModel};
    use super::super::types::Category;
    use super::*;

    const DIM: usize = 4;

    fn test_store() -> (tempfile::TempDir, KnowledgeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            KnowledgeStore::create(&dir.path().join("knowledge.db"), "embedding-001", DIM)
                .unwrap();
        (dir, store)
    }

    fn test_workflow(
        store: KnowledgeStore,
        responses: &[&str],
    ) -> (Arc<ScriptedModel>, SupportWorkflow) {
        let model = Arc::new(ScriptedModel::new(responses));
        let workflow =
            SupportWorkflow::new(model.clone(), Arc::new(FixedEmbedding::new(DIM)), store);
        (model, workflow)
    }

    // =========================================================================
    // Routing Paths
    // =========================================================================

    #[tokio::test]
    async fn escalation_path_returns_the_fixed_message_without_a_second_model_call() {
        let (_dir, store) = test_store();
        let embedder = Arc::new(FixedEmbedding::new(DIM));
        let model = Arc::new(ScriptedModel::new(&["ESCALATE"]));
        let workflow = SupportWorkflow::new(model.clone(), embedder.clone(), store);

        let result = workflow.process("I want to speak to a manager!").await.unwrap();

        assert_eq!(result.category, Category::Escalate);
        assert!(result.needs_escalation);
        assert_eq!(result.response, escalation::escalation_response());
        // Only the classification call; no retrieval, no generation.
        assert_eq!(model.call_count(), 1);
        assert!(embedder.embedded_texts().is_empty());
    }

    #[tokio::test]
    async fn answer_path_classifies_then_answers() {
        let (_dir, store) = test_store();
        store
            .insert_passage(
                "product_info.txt",
                0,
                "SmartWatch Pro X: $299",
                "h",
                &[1.0, 0.0, 0.0, 0.0],
            )
            .unwrap();

        let (model, workflow) =
            test_workflow(store, &["PRODUCTS", "The SmartWatch Pro X costs $299."]);

        let result = workflow.process("How much is the SmartWatch?").await.unwrap();

        assert_eq!(result.category, Category::Products);
        assert!(!result.needs_escalation);
        assert_eq!(result.response, "The SmartWatch Pro X costs $299.");
        assert_eq!(model.call_count(), 2);
        // The second call carries the retrieved context.
        assert!(model.calls()[1].prompt.contains("SmartWatch Pro X: $299"));
    }

    #[tokio::test]
    async fn needs_escalation_matches_category_for_every_label() {
        for (label, category) in [
            ("PRODUCTS", Category::Products),
            ("RETURNS", Category::Returns),
            ("GENERAL", Category::General),
            ("ESCALATE", Category::Escalate),
        ] {
            let (_dir, store) = test_store();
            let (_model, workflow) = test_workflow(store, &[label, "some answer"]);

            let result = workflow.process("a query").await.unwrap();
            assert_eq!(result.category, category);
            assert_eq!(result.needs_escalation, category == Category::Escalate);
        }
    }

    #[tokio::test]
    async fn classifier_fallback_still_answers() {
        let (_dir, store) = test_store();
        let (_model, workflow) =
            test_workflow(store, &["no idea what this is", "Here is what I found."]);

        let result = workflow.process("something odd").await.unwrap();
        assert_eq!(result.category, Category::General);
        assert!(!result.needs_escalation);
        assert_eq!(result.response, "Here is what I found.");
    }

    #[tokio::test]
    async fn empty_index_query_still_succeeds() {
        let (_dir, store) = test_store();
        let (_model, workflow) = test_workflow(store, &["GENERAL", "We are open 9 to 5."]);

        let result = workflow.process("When are you open?").await.unwrap();
        assert_eq!(result.response, "We are open 9 to 5.");
    }

    #[tokio::test]
    async fn retrieval_uses_the_original_query() {
        let (_dir, store) = test_store();
        let embedder = Arc::new(FixedEmbedding::new(DIM));
        let workflow = SupportWorkflow::new(
            Arc::new(ScriptedModel::new(&["PRODUCTS", "answer"])),
            embedder.clone(),
            store,
        );

        workflow.process("What chargers do you sell?").await.unwrap();
        assert_eq!(
            embedder.embedded_texts(),
            vec!["What chargers do you sell?".to_string()]
        );
    }

    // =========================================================================
    // Failure Propagation
    // =========================================================================

    #[tokio::test]
    async fn classification_failure_propagates() {
        let (_dir, store) = test_store();
        let workflow = SupportWorkflow::new(
            Arc::new(FailingModel),
            Arc::new(FixedEmbedding::new(DIM)),
            store,
        );

        let err = workflow.process("hello").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Model(_)));
    }

    #[tokio::test]
    async fn answer_failure_propagates() {
        let (_dir, store) = test_store();
        // One scripted response: classification succeeds, generation runs dry.
        let (_model, workflow) = test_workflow(store, &["PRODUCTS"]);

        let err = workflow.process("What do you sell?").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Model(_)));
    }
}
