//! Session domain model.
//!
//! This module contains the core Session entity that represents one titled
//! conversation in the application's domain layer.

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::ids;

/// A titled, ordered conversation.
///
/// The message sequence is append-mostly and ordered by insertion; it is
/// never reordered. `last_message` and `last_updated` are denormalized from
/// the tail of `messages` and must be refreshed on every mutation, which is
/// why appends go through [`Session::push_message`] instead of touching the
/// vector directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Human-readable session title.
    pub title: String,
    /// Preview of the most recent message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    /// Timestamp of the last mutation as epoch milliseconds.
    pub last_updated: i64,
    /// Conversation turns in insertion order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Creates an empty session with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ids::session_id(),
            title: title.into(),
            last_message: None,
            last_updated: ids::now_millis(),
            messages: Vec::new(),
        }
    }

    /// Appends a message and refreshes the denormalized tail fields.
    pub fn push_message(&mut self, message: Message) {
        self.last_message = Some(message.content.clone());
        self.last_updated = ids::now_millis();
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_message_refreshes_tail_fields() {
        let mut session = Session::new("Session 1");
        assert!(session.last_message.is_none());

        session.push_message(Message::user("first", Vec::new()));
        session.push_message(Message::model("second", Vec::new()));

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.last_message.as_deref(), Some("second"));
        assert!(session.last_updated >= session.messages[0].timestamp);
    }

    #[test]
    fn messages_keep_insertion_order() {
        let mut session = Session::new("ordering");
        for i in 0..5 {
            session.push_message(Message::user(format!("turn {i}"), Vec::new()));
        }
        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["turn 0", "turn 1", "turn 2", "turn 3", "turn 4"]);
    }
}
