//! Pulling the generated text out of a provider's raw response body.
//!
//! Generative-model APIs wrap the text in provider-specific envelopes. The
//! known shapes are tried first; otherwise the first non-empty string leaf
//! is taken.

use serde_json::Value;

use crate::visit::find_string;

/// JSON pointers to the generated text in known response shapes.
const KNOWN_TEXT_POINTERS: [&str; 2] = [
    // generateContent-style responses
    "/candidates/0/content/parts/0/text",
    // chat-completions-style responses
    "/choices/0/message/content",
];

/// Return the generated text from a provider response body, if any.
pub fn response_text(body: &Value, max_depth: usize) -> Option<&str> {
    KNOWN_TEXT_POINTERS
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .or_else(|| find_string(body, max_depth, |s| !s.trim().is_empty()))
}
