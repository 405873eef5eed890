//! Flattening of a conversation's message tree.
//!
//! Normalization never fails. Content shapes that are not recognised are
//! serialized back to JSON text so one odd message cannot sink a whole
//! conversation.

use serde_json::Value;

use crate::models::{Conversation, NormalizedMessage, RawConversation, RawMessage};

const UNKNOWN: &str = "unknown";

/// Shapes message content arrives in, probed in this order.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent<'a> {
    /// `{ "parts": [...] }`
    Parts(&'a [Value]),
    /// `{ "text": ... }`
    Text(&'a Value),
    /// `[ { "text": ... }, ... ]`
    Sequence(&'a [Value]),
    /// Anything else, kept as JSON.
    Other(&'a Value),
    Missing,
}

impl<'a> MessageContent<'a> {
    pub fn classify(content: Option<&'a Value>) -> Self {
        let Some(content) = content else {
            return Self::Missing;
        };

        if let Some(parts) = content.get("parts").and_then(Value::as_array) {
            return Self::Parts(parts);
        }
        if let Some(text) = content.get("text").filter(|t| is_truthy(t)) {
            return Self::Text(text);
        }
        if let Some(items) = content.as_array() {
            return Self::Sequence(items);
        }
        Self::Other(content)
    }

    pub fn render(&self) -> String {
        match self {
            Self::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    Value::Null => String::new(),
                    other => as_text(other),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Text(text) => as_text(text),
            Self::Sequence(items) => items
                .iter()
                .map(|item| match item.get("text").filter(|t| is_truthy(t)) {
                    Some(text) => as_text(text),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Other(value) => value.to_string(),
            Self::Missing => String::new(),
        }
    }
}

/// Strings verbatim, everything else as compact JSON.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn normalize_message(message: &RawMessage) -> NormalizedMessage {
    NormalizedMessage {
        role: message.role.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        content: MessageContent::classify(message.content.as_ref()).render(),
        model: message
            .model_slug
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        create_time: message.create_time,
    }
}

/// Flatten a raw conversation. Messages keep the backend's mapping order,
/// which is not necessarily chronological; nodes without a message are
/// skipped.
pub fn normalize(raw: &RawConversation) -> Conversation {
    let messages = raw
        .mapping
        .iter()
        .filter_map(|node| node.message.as_ref())
        .map(normalize_message)
        .collect();

    Conversation {
        messages,
        create_time: raw.create_time,
        title: raw.title.clone(),
    }
}
