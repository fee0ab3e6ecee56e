//! In-memory `ChatApi` used by the sync and view tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{ApiError, ChatApi};
use crate::models::{
    Conversation, ConversationRef, Message, MessageSender, MessageStatus, MessageType, Person,
    PersonRef,
};

/// A backend call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListConversations,
    ListMessages(String),
    Send(String, String),
    MarkRead(String),
}

/// Scriptable backend that records every call.
#[derive(Default)]
pub struct FakeApi {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<HashMap<String, Vec<Message>>>,
    message_delays: Mutex<HashMap<String, Duration>>,
    send_delay: Mutex<Duration>,
    calls: Mutex<Vec<Call>>,
    pub fail_conversations: AtomicBool,
    pub fail_messages: AtomicBool,
    pub fail_send: AtomicBool,
    pub fail_mark_read: AtomicBool,
}

impl FakeApi {
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        let api = Self::default();
        *api.conversations.lock().unwrap() = conversations;
        api
    }

    pub fn set_messages(&self, conversation_id: &str, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), messages);
    }

    pub fn set_message_delay(&self, conversation_id: &str, delay: Duration) {
        self.message_delays
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), delay);
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ChatApi for FakeApi {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.record(Call::ListConversations);
        if self.fail_conversations.load(Ordering::SeqCst) {
            return Err(status_error(500));
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.record(Call::ListMessages(conversation_id.to_string()));
        let delay = self
            .message_delays
            .lock()
            .unwrap()
            .get(conversation_id)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(status_error(500));
        }
        let messages = self.messages.lock().unwrap().get(conversation_id).cloned();
        Ok(messages.unwrap_or_default())
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        self.record(Call::Send(conversation_id.to_string(), content.to_string()));
        let delay = *self.send_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(status_error(500));
        }
        Ok(message("sent", conversation_id, "2024-01-01T12:00:00Z"))
    }

    async fn mark_read(&self, conversation_id: &str) -> Result<(), ApiError> {
        self.record(Call::MarkRead(conversation_id.to_string()));
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(status_error(503));
        }
        Ok(())
    }
}

pub fn status_error(status: u16) -> ApiError {
    ApiError::status(status, "http://fake/api/conversations", "fake failure")
}

pub fn conversation(id: &str, name: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        person: PersonRef::Inline(Person {
            id: format!("p-{}", id),
            name: name.to_string(),
            phone_number: "+15550100".to_string(),
            email: None,
            tags: None,
            created_at: None,
            updated_at: None,
        }),
        title: None,
        last_message: None,
        last_message_timestamp: None,
        unread_count: 0,
        is_active: true,
        tags: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn message(id: &str, conversation_id: &str, timestamp: &str) -> Message {
    Message {
        id: id.to_string(),
        conversation: ConversationRef::Reference(conversation_id.to_string()),
        sender: MessageSender::Contact,
        kind: MessageType::Text,
        content: format!("message {}", id),
        media_url: None,
        status: MessageStatus::Delivered,
        metadata: None,
        timestamp: timestamp.parse().expect("valid RFC 3339 timestamp"),
        created_at: None,
        updated_at: None,
    }
}
