//! Conversation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PersonRef;

/// Name shown for a conversation whose person was not populated.
pub const UNKNOWN_PERSON: &str = "Unknown";

/// A thread between the operator and one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub person: PersonRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_timestamp: Option<DateTime<Utc>>,
    /// Backend-authoritative; never decremented locally.
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Display name: the person's name, or "Unknown" for a bare reference.
    pub fn display_name(&self) -> &str {
        self.person.name().unwrap_or(UNKNOWN_PERSON)
    }

    /// Case-insensitive substring match against the person's name.
    ///
    /// The query is used as typed, whitespace included. Conversations without
    /// a populated person only match the empty query.
    pub fn matches_name(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.person
            .name()
            .is_some_and(|name| name.to_lowercase().contains(&query))
    }
}

/// The `conversation` field of a message: a bare id or the full object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversationRef {
    Reference(String),
    Inline(Box<Conversation>),
}

impl ConversationRef {
    pub fn id(&self) -> &str {
        match self {
            ConversationRef::Reference(id) => id,
            ConversationRef::Inline(conversation) => &conversation.id,
        }
    }
}
