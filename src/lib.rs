// ABOUTME: Core library for the TechGear support agent.
// ABOUTME: Contains the query workflow, Gemini clients, and the knowledge index.

pub mod config;
pub mod gemini;
pub mod orchestrator;

pub mod services {
    pub mod chunker;
    pub mod indexer;
    pub mod vector_store;
}

pub use config::{AgentConfig, ConfigError};
pub use gemini::GeminiClient;
pub use orchestrator::service::SupportWorkflow;
pub use orchestrator::types::{Category, QueryResponse, WorkflowError};
pub use services::vector_store::KnowledgeStore;
