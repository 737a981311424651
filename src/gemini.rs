// ABOUTME: Gemini REST client implementing the generation and embedding traits.
// ABOUTME: One stateless request per call; errors map onto ModelError variants.

use async_trait::async_trait;
use log;

use crate::config::AgentConfig;
use crate::orchestrator::model::{EmbeddingModel, GenerationModel, ModelError};

/// Default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";

/// Dimensionality of vectors produced by the default embedding model.
pub const EMBEDDING_DIM: usize = 768;

/// Base URL of the Generative Language REST API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini generateContent and embedContent endpoints.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    generation_model: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: API_BASE_URL.to_string(),
            api_key: config.api_key.clone(),
            generation_model: config.generation_model.clone(),
            embedding_model: config.embedding_model.clone(),
        }
    }

    /// Build the request body for the generateContent endpoint.
    fn build_generation_body(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_output_tokens
            }
        })
    }

    /// Build the request body for the embedContent endpoint.
    fn build_embed_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": format!("models/{}", self.embedding_model),
            "content": { "parts": [{ "text": text }] }
        })
    }

    /// Build the request body for the batchEmbedContents endpoint.
    fn build_batch_embed_body(&self, texts: &[String]) -> serde_json::Value {
        let requests: Vec<serde_json::Value> =
            texts.iter().map(|text| self.build_embed_body(text)).collect();
        serde_json::json!({ "requests": requests })
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_candidate_text(body: &serde_json::Value) -> Option<String> {
        let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Pull the vector out of an embedding object (`{"values": [...]}`).
    fn extract_embedding(value: &serde_json::Value) -> Option<Vec<f32>> {
        let values = value.get("values")?.as_array()?;
        Some(
            values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect(),
        )
    }

    /// Pull the API error message out of a non-success body, falling back to
    /// a truncated copy of the raw text.
    fn extract_error_message(body_text: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body_text)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| body_text.chars().take(200).collect())
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            log::error!("[Gemini] HTTP {} from API", status);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: Self::extract_error_message(&body_text),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))
    }
}

#[async_trait]
impl GenerationModel for GeminiClient {
    fn id(&self) -> &str {
        &self.generation_model
    }

    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.generation_model
        );
        log::debug!(
            "[Gemini] generateContent: {} chars, temperature {}",
            prompt.chars().count(),
            temperature
        );

        let body = self.build_generation_body(prompt, temperature, max_output_tokens);
        let response = self.post_json(&url, &body).await?;

        Self::extract_candidate_text(&response).ok_or(ModelError::EmptyResponse)
    }
}

#[async_trait]
impl EmbeddingModel for GeminiClient {
    fn id(&self) -> &str {
        &self.embedding_model
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url, self.embedding_model
        );

        let body = self.build_embed_body(text);
        let response = self.post_json(&url, &body).await?;

        response
            .get("embedding")
            .and_then(Self::extract_embedding)
            .ok_or(ModelError::EmptyResponse)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/models/{}:batchEmbedContents",
            self.base_url, self.embedding_model
        );

        let body = self.build_batch_embed_body(texts);
        let response = self.post_json(&url, &body).await?;

        let embeddings = response
            .get("embeddings")
            .and_then(|e| e.as_array())
            .ok_or(ModelError::EmptyResponse)?;

        let vectors: Vec<Vec<f32>> = embeddings
            .iter()
            .filter_map(Self::extract_embedding)
            .collect();

        if vectors.len() != texts.len() {
            return Err(ModelError::EmptyResponse);
        }

        Ok(vectors)
    }
}
