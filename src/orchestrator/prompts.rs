// ABOUTME: Versioned prompt templates and the placeholder renderer
// ABOUTME: Templates are constants; substitution is one literal left-to-right pass

/// Classifier instruction template, v1. Placeholder: `{query}`.
pub const CLASSIFIER_PROMPT_V1: &str = r#"You are a query classifier for TechGear Electronics customer support.
Analyze the customer query and classify it into ONE of these categories:

- PRODUCTS: Questions about product features, specifications, prices, availability, compatibility, troubleshooting, or technical support
- RETURNS: Questions about returns, refunds, exchanges, order cancellations, or warranty claims
- GENERAL: General inquiries about store hours, locations, payment methods, shipping, or company information
- ESCALATE: Complaints, issues requiring human intervention, legal matters, or requests to speak with a manager

Customer Query: {query}

Respond with ONLY the category name (PRODUCTS, RETURNS, GENERAL, or ESCALATE), nothing else."#;

/// Support answer template, v1. Placeholders: `{context}` and `{question}`.
pub const SUPPORT_PROMPT_V1: &str = r#"You are a helpful and friendly customer support agent for TechGear Electronics.
Your role is to assist customers with their product inquiries, technical support questions, and general information.

Guidelines:
- Be polite, professional, and helpful at all times
- Provide accurate information based on the context provided
- If the information is not in the context, say you don't have that specific information and suggest contacting support
- Include relevant product details like prices, features, and SKUs when available
- For troubleshooting, provide clear step-by-step instructions
- Keep responses concise but comprehensive

Context from knowledge base:
{context}

Customer Query: {question}

Response:"#;

/// Substitutes `{name}` placeholders in a single left-to-right pass.
///
/// Placeholder-shaped text inside substituted values is left alone, and
/// placeholders with no matching entry stay in the output verbatim.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail.find('}') {
            Some(close) => {
                let name = &tail[1..close];
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&tail[..=close]),
                }
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn render_classifier_prompt(query: &str) -> String {
    render(CLASSIFIER_PROMPT_V1, &[("query", query)])
}

pub fn render_support_prompt(context: &str, question: &str) -> String {
    render(
        SUPPORT_PROMPT_V1,
        &[("context", context), ("question", question)],
    )
}
