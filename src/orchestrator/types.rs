// ABOUTME: Core types for the workflow: category labels, staged state records, errors.
// ABOUTME: Staged records make skipped or repeated workflow steps unrepresentable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::ModelError;
use crate::services::vector_store::StoreError;

/// Closed set of support categories a query can be filed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Products,
    Returns,
    General,
    Escalate,
}

impl Category {
    /// Parses a raw classifier completion. Tolerates surrounding whitespace
    /// and any casing; anything outside the closed set is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "PRODUCTS" => Some(Self::Products),
            "RETURNS" => Some(Self::Returns),
            "GENERAL" => Some(Self::General),
            "ESCALATE" => Some(Self::Escalate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "PRODUCTS",
            Self::Returns => "RETURNS",
            Self::General => "GENERAL",
            Self::Escalate => "ESCALATE",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A freshly received query, before classification.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    query: String,
}

impl WorkflowState {
    pub fn start(query: &str) -> Self {
        Self {
            query: query.to_string(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Advances to the classified stage. Consumes the record so a query
    /// cannot be classified twice.
    pub fn classified(self, category: Category) -> ClassifiedState {
        ClassifiedState {
            query: self.query,
            category,
        }
    }
}

/// A query with its category assigned, before a response exists.
#[derive(Debug, Clone)]
pub struct ClassifiedState {
    query: String,
    category: Category,
}

impl ClassifiedState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether this query must be handed to a human. Derived from the
    /// category so the two can never disagree.
    pub fn needs_escalation(&self) -> bool {
        self.category == Category::Escalate
    }

    /// Advances to the terminal stage with the produced response text.
    pub fn responded(self, response: String) -> QueryResponse {
        QueryResponse {
            category: self.category,
            response,
            needs_escalation: self.category == Category::Escalate,
        }
    }
}

/// Final record returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub category: Category,
    pub response: String,
    pub needs_escalation: bool,
}

/// Failure of one workflow invocation. Carries no partial response.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),
    #[error("Knowledge store failure: {0}")]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}
