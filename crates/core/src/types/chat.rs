//! Chat transcript types for the shopping assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opening message of every new transcript.
pub const GREETING: &str = "👋 Hi! How can I help you find the perfect product today?";

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn now(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Ordered, append-only list of chat messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// An empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// A transcript opened by the assistant greeting.
    #[must_use]
    pub fn with_greeting() -> Self {
        let mut transcript = Self::new();
        transcript.push_assistant(GREETING);
        transcript
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::now(ChatRole::User, text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::now(ChatRole::Assistant, text));
    }

    /// Append a streamed chunk to the last assistant message.
    ///
    /// Starts a new assistant message if the transcript does not end with one.
    pub fn append_to_last_assistant(&mut self, chunk: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == ChatRole::Assistant => last.text.push_str(chunk),
            _ => self.push_assistant(chunk),
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_greeting() {
        let t = ChatTranscript::with_greeting();
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].role, ChatRole::Assistant);
        assert_eq!(t.messages()[0].text, GREETING);
    }

    #[test]
    fn test_append_to_last_assistant_accumulates_in_order() {
        let mut t = ChatTranscript::new();
        t.push_user("hi");
        t.push_assistant("");
        t.append_to_last_assistant("Hel");
        t.append_to_last_assistant("lo");
        assert_eq!(t.len(), 2);
        assert_eq!(t.last().map(|m| m.text.as_str()), Some("Hello"));
    }

    #[test]
    fn test_append_after_user_starts_new_message() {
        let mut t = ChatTranscript::new();
        t.push_user("hi");
        t.append_to_last_assistant("Hey");
        assert_eq!(t.len(), 2);
        assert_eq!(t.last().map(|m| m.role), Some(ChatRole::Assistant));
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&ChatRole::Assistant).expect("serialize");
        assert_eq!(json, "\"assistant\"");
    }
}
