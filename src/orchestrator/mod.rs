// ABOUTME: Workflow module for routing customer queries to the right responder.
// ABOUTME: Contains types, model traits, classifier, router, and responders.

pub mod answerer;
pub mod classifier;
pub mod escalation;
pub mod model;
pub mod prompts;
pub mod retriever;
pub mod router;
pub mod service;
pub mod types;
