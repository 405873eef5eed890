//! Records flowing through a harvest run.
//!
//! Raw types are parsed leniently from whatever the backend returns; the
//! normalized types are what ends up in the archive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A conversation id surfaced by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: String,
    /// Page offset the id was listed on. Only used for progress lines.
    pub offset: u64,
}

impl ConversationRef {
    pub fn new(id: impl Into<String>, offset: u64) -> Self {
        Self {
            id: id.into(),
            offset,
        }
    }
}

/// One page of the conversation listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPage {
    pub items: Vec<ConversationRef>,
    /// Total conversation count as reported by the backend.
    pub total: u64,
}

/// Conversation as returned by the per-id endpoint.
///
/// Never fails to parse: fields of an unexpected type are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawConversation {
    pub title: Option<String>,
    pub create_time: Option<f64>,
    /// Message tree nodes in the order the backend listed them.
    pub mapping: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub key: String,
    /// `None` for nodes without a message payload (e.g. the tree root).
    pub message: Option<RawMessage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMessage {
    pub role: Option<String>,
    pub model_slug: Option<String>,
    pub create_time: Option<f64>,
    pub content: Option<Value>,
}

impl From<Value> for RawConversation {
    fn from(value: Value) -> Self {
        let mapping = value
            .get("mapping")
            .and_then(Value::as_object)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|(key, node)| RawNode {
                        key: key.clone(),
                        message: node.get("message").and_then(RawMessage::from_value),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: value.get("title").and_then(Value::as_str).map(str::to_string),
            create_time: value.get("create_time").and_then(Value::as_f64),
            mapping,
        }
    }
}

impl RawMessage {
    /// `None` when the node carries no message.
    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        Some(Self {
            role: non_empty_str(value.pointer("/author/role")),
            model_slug: non_empty_str(value.pointer("/metadata/model_slug")),
            create_time: value.get("create_time").and_then(Value::as_f64),
            content: value.get("content").cloned(),
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A single message flattened out of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub role: String,
    pub content: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<f64>,
}

/// A normalized conversation, as written to the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<NormalizedMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_raw_conversation_keeps_mapping_order() {
        let raw: RawConversation = serde_json::from_value(json!({
            "title": "Trip",
            "create_time": 1700000000.5,
            "mapping": {
                "z": { "message": null },
                "a": { "message": { "author": { "role": "user" }, "content": { "parts": ["x"] } } },
                "m": { "message": { "author": { "role": "assistant" }, "metadata": { "model_slug": "gpt-4" } } }
            }
        }))
        .unwrap();

        assert_eq!(raw.title.as_deref(), Some("Trip"));
        assert_eq!(raw.create_time, Some(1700000000.5));
        let keys: Vec<&str> = raw.mapping.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert!(raw.mapping[0].message.is_none());
        assert_eq!(raw.mapping[1].message.as_ref().unwrap().role.as_deref(), Some("user"));
        assert_eq!(
            raw.mapping[2].message.as_ref().unwrap().model_slug.as_deref(),
            Some("gpt-4")
        );
    }

    #[test]
    fn test_raw_conversation_tolerates_odd_shapes() {
        let raw: RawConversation = serde_json::from_value(json!({
            "title": 42,
            "create_time": "yesterday",
            "mapping": []
        }))
        .unwrap();
        assert_eq!(raw, RawConversation::default());

        let raw: RawConversation = serde_json::from_value(json!("not an object")).unwrap();
        assert!(raw.mapping.is_empty());
    }

    #[test]
    fn test_archive_omits_absent_fields() {
        let conversation = Conversation {
            messages: vec![NormalizedMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
                model: "unknown".to_string(),
                create_time: None,
            }],
            create_time: None,
            title: Some("t".to_string()),
        };
        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{ "role": "user", "content": "hi", "model": "unknown" }],
                "title": "t"
            })
        );
    }
}
