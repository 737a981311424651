// ABOUTME: Fixed human-handoff response for escalated queries
// ABOUTME: Pure constant; this path never calls a model and never fails

/// Escalation template, v1. Returned verbatim for every escalated query.
pub const ESCALATION_MESSAGE_V1: &str = r#"I understand your concern, and I want to make sure you receive the best possible assistance.

I'm connecting you with one of our customer support specialists who can help you further. A team member will be with you shortly.

**What you can expect:**
- A support specialist will contact you within 24 hours
- For urgent matters, please call our toll-free number: 1800-102-TECH (1800-102-8324)
- You can also email us at support@techgear.com

Thank you for your patience. Is there anything else I can help you with in the meantime?"#;

/// The human-handoff response. Byte-identical on every call.
pub fn escalation_response() -> &'static str {
    ESCALATION_MESSAGE_V1
}
