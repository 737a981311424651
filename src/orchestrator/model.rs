// ABOUTME: Client traits for the remote generation and embedding models
// ABOUTME: The workflow nodes depend on these seams, never on a provider

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the remote model clients.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Model returned no usable output")]
    EmptyResponse,
}

/// Text generation against a remote model. One stateless call per request;
/// retries and backoff are not this layer's concern.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Identifier of the underlying model, for logs and diagnostics.
    fn id(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, ModelError>;
}

/// Text embedding against a remote model.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Identifier of the underlying model. Stamped into the index metadata
    /// at build time and checked again when the index is opened.
    fn id(&self) -> &str;

    /// Dimensionality of the vectors this model produces.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    /// Embeds a batch of texts in order. The default implementation calls
    /// `embed` once per text; clients with a batch endpoint override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}
