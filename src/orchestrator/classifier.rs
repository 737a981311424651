// ABOUTME: Query classifier backed by a constrained generation-model call.
// ABOUTME: Unrecognized model output falls back to GENERAL, never an error.

use std::sync::Arc;

use super::model::{GenerationModel, ModelError};
use super::prompts;
use super::types::Category;

/// Sampling temperature for classification. Zero keeps the label stable.
pub const CLASSIFIER_TEMPERATURE: f32 = 0.0;

/// Output cap for classification. The completion is a single label.
pub const CLASSIFIER_MAX_OUTPUT_TOKENS: u32 = 20;

pub struct QueryClassifier {
    model: Arc<dyn GenerationModel>,
}

impl QueryClassifier {
    pub fn new(model: Arc<dyn GenerationModel>) -> Self {
        Self { model }
    }

    /// Classify a query into one of the closed categories.
    ///
    /// The model is asked for the bare label at temperature zero. Output
    /// that does not normalize to a known label becomes `General`; model
    /// and transport failures propagate to the caller unchanged.
    pub async fn classify(&self, query: &str) -> Result<Category, ModelError> {
        let prompt = prompts::render_classifier_prompt(query);
        let raw = self
            .model
            .generate(&prompt, CLASSIFIER_TEMPERATURE, CLASSIFIER_MAX_OUTPUT_TOKENS)
            .await?;

        match Category::parse(&raw) {
            Some(category) => {
                log::info!("[Classifier] Query classified as {}", category);
                Ok(category)
            }
            None => {
                log::warn!(
                    "[Classifier] Unrecognized label {:?} from {}, falling back to GENERAL",
                    raw.trim(),
                    self.model.id()
                );
                Ok(Category::General)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::mock::{FailingModel, ScriptedModel};
    use super::*;

    #[tokio::test]
    async fn maps_each_label_to_its_category() {
        for (label, expected) in [
            ("PRODUCTS", Category::Products),
            ("RETURNS", Category::Returns),
            ("GENERAL", Category::General),
            ("ESCALATE", Category::Escalate),
        ] {
            let classifier = QueryClassifier::new(Arc::new(ScriptedModel::new(&[label])));
            assert_eq!(classifier.classify("any query").await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn normalizes_casing_and_whitespace() {
        let classifier = QueryClassifier::new(Arc::new(ScriptedModel::new(&["  returns \n"])));
        assert_eq!(
            classifier.classify("How do I get a refund?").await.unwrap(),
            Category::Returns
        );
    }

    #[tokio::test]
    async fn unrecognized_output_falls_back_to_general() {
        let classifier = QueryClassifier::new(Arc::new(ScriptedModel::new(&[
            "I think this is about PRODUCTS",
        ])));
        assert_eq!(
            classifier.classify("hmm").await.unwrap(),
            Category::General
        );
    }

    #[tokio::test]
    async fn empty_output_falls_back_to_general() {
        let classifier = QueryClassifier::new(Arc::new(ScriptedModel::new(&[""])));
        assert_eq!(
            classifier.classify("hello?").await.unwrap(),
            Category::General
        );
    }

    #[tokio::test]
    async fn uses_zero_temperature_and_a_small_output_cap() {
        let model = Arc::new(ScriptedModel::new(&["GENERAL"]));
        let classifier = QueryClassifier::new(model.clone());
        classifier.classify("What are your store hours?").await.unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.0);
        assert_eq!(calls[0].max_output_tokens, CLASSIFIER_MAX_OUTPUT_TOKENS);
        assert!(calls[0].prompt.contains("Customer Query: What are your store hours?"));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let classifier = QueryClassifier::new(Arc::new(FailingModel));
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, ModelError::Transport(_)));
    }
}
