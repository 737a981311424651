// ABOUTME: Process-wide agent configuration loaded from the environment
// ABOUTME: Missing required values fail at startup, never per query

use std::path::PathBuf;

use thiserror::Error;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Environment variable overriding the knowledge database location.
pub const KNOWLEDGE_DB_ENV_VAR: &str = "TECHGEAR_KNOWLEDGE_DB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("Could not determine a data directory for the knowledge database")]
    NoDataDir,
}

/// Immutable configuration shared by both binaries. Built once at startup
/// and passed down to every collaborator that needs it.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub knowledge_db_path: PathBuf,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            non_blank(std::env::var(API_KEY_ENV_VAR)).ok_or(ConfigError::MissingApiKey)?;

        let knowledge_db_path = match non_blank(std::env::var(KNOWLEDGE_DB_ENV_VAR)) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        Ok(Self {
            api_key,
            generation_model: crate::gemini::DEFAULT_GENERATION_MODEL.to_string(),
            embedding_model: crate::gemini::DEFAULT_EMBEDDING_MODEL.to_string(),
            knowledge_db_path,
        })
    }
}

fn non_blank(value: Result<String, std::env::VarError>) -> Option<String> {
    value.ok().filter(|v| !v.trim().is_empty())
}

fn default_db_path() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(data_dir.join("techgear-support").join("knowledge.db"))
}
