// ABOUTME: Pure routing predicate mapping a category to its terminal node
// ABOUTME: Decides from the category alone; the raw query is never consulted

use super::types::Category;

/// Terminal node selected for a classified query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Retrieval-augmented answer generation.
    Answer,
    /// Fixed human-handoff response.
    Escalate,
}

/// Route a classified query to its terminal node.
///
/// Routing rules:
/// 1. ESCALATE → the fixed escalation response
/// 2. Everything else → retrieval-augmented answer generation
pub fn route(category: Category) -> Route {
    match category {
        Category::Escalate => Route::Escalate,
        Category::Products | Category::Returns | Category::General => Route::Answer,
    }
}
