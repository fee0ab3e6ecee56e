//! Message-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConversationRef;

/// Who authored a message.
///
/// `System` is the operator's own outgoing message; the thread view shows it
/// as "sent by me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Contact,
    System,
}

impl MessageSender {
    pub fn is_operator(&self) -> bool {
        matches!(self, MessageSender::System)
    }
}

/// Message payload type. Only `Text` is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    Document,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::Document => "document",
        }
    }
}

/// Delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub conversation: ConversationRef,
    pub sender: MessageSender,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn conversation_id(&self) -> &str {
        self.conversation.id()
    }

    /// Text shown in the thread view. Non-text payloads get a placeholder.
    pub fn display_text(&self) -> String {
        match self.kind {
            MessageType::Text => self.content.clone(),
            other => format!("[{}]", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT_MESSAGE: &str = r#"{
        "_id": "m1",
        "conversation": "c1",
        "sender": "system",
        "type": "text",
        "content": "Hello there",
        "status": "delivered",
        "metadata": {"source": "api", "retries": 0},
        "timestamp": "2024-01-01T10:00:00.123Z",
        "createdAt": "2024-01-01T10:00:00.123Z",
        "updatedAt": "2024-01-01T10:00:01Z"
    }"#;

    #[test]
    fn test_deserialize_text_message() {
        let msg: Message = serde_json::from_str(TEXT_MESSAGE).unwrap();
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.conversation_id(), "c1");
        assert!(msg.sender.is_operator());
        assert_eq!(msg.kind, MessageType::Text);
        assert_eq!(msg.status, MessageStatus::Delivered);
        assert_eq!(msg.display_text(), "Hello there");
        assert_eq!(
            msg.metadata
                .as_ref()
                .and_then(|m| m.get("source"))
                .and_then(|v| v.as_str()),
            Some("api")
        );
    }

    #[test]
    fn test_timestamp_keeps_milliseconds() {
        let msg: Message = serde_json::from_str(TEXT_MESSAGE).unwrap();
        assert_eq!(msg.timestamp.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_non_text_placeholder() {
        let json = r#"{
            "_id": "m2",
            "conversation": "c1",
            "sender": "contact",
            "type": "image",
            "content": "",
            "mediaUrl": "https://cdn.example.com/a.jpg",
            "status": "read",
            "timestamp": "2024-01-01T10:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(!msg.sender.is_operator());
        assert_eq!(msg.display_text(), "[image]");
        assert_eq!(msg.media_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_unknown_sender_rejected() {
        let json = TEXT_MESSAGE.replace(r#""sender": "system""#, r#""sender": "robot""#);
        assert!(serde_json::from_str::<Message>(&json).is_err());
    }
}
