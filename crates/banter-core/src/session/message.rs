//! Conversation message types.

use serde::{Deserialize, Serialize};

use crate::ids;

/// Represents the author of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message composed by the user.
    User,
    /// Message produced by the remote model.
    Model,
}

/// A single turn in a session.
///
/// Messages are immutable once appended to a session; editing is modeled by
/// re-populating the compose input, never by mutating a stored turn. Images
/// travel as data URLs (`data:<mime>;base64,<payload>`), the same
/// representation the display layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier within the owning session.
    pub id: String,
    /// Who authored this turn.
    pub role: MessageRole,
    /// Text content, possibly empty for image-only turns.
    pub content: String,
    /// Creation time as epoch milliseconds.
    pub timestamp: i64,
    /// Inline images in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Message {
    /// Creates a user turn with a fresh id and the current timestamp.
    pub fn user(content: impl Into<String>, images: Vec<String>) -> Self {
        Self::new(MessageRole::User, content, images)
    }

    /// Creates a model turn with a fresh id and the current timestamp.
    pub fn model(content: impl Into<String>, images: Vec<String>) -> Self {
        Self::new(MessageRole::Model, content, images)
    }

    fn new(role: MessageRole, content: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            id: ids::timestamp_id(),
            role,
            content: content.into(),
            timestamp: ids::now_millis(),
            images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let value = serde_json::to_value(MessageRole::User).unwrap();
        assert_eq!(value, serde_json::json!("user"));
        let value = serde_json::to_value(MessageRole::Model).unwrap();
        assert_eq!(value, serde_json::json!("model"));
    }

    #[test]
    fn consecutive_messages_get_distinct_ids() {
        let a = Message::user("hello", Vec::new());
        let b = Message::model("hi there", Vec::new());
        assert_ne!(a.id, b.id);
    }
}
