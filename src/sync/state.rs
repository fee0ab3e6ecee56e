//! Conversation and message stores plus the view-level flags around them.
//!
//! Everything here is plain data mutated by the single event loop that owns
//! it. Network results arrive as values and are applied in order.

use crate::api::ApiError;
use crate::models::{Conversation, Message};

/// Which fetch produced the visible error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Conversations,
    Messages,
}

impl FetchKind {
    fn failure_text(&self) -> &'static str {
        match self {
            FetchKind::Conversations => "Failed to load conversations",
            FetchKind::Messages => "Failed to load messages",
        }
    }
}

/// Ordered conversation list and the active selection.
#[derive(Debug, Default)]
pub struct ConversationStore {
    items: Vec<Conversation>,
    /// Snapshot of the selected conversation. Kept even if a later refresh
    /// no longer lists it.
    active: Option<Conversation>,
}

impl ConversationStore {
    pub fn items(&self) -> &[Conversation] {
        &self.items
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.id.as_str())
    }

    /// The active conversation, preferring the freshest copy from the list.
    pub fn active(&self) -> Option<&Conversation> {
        let active = self.active.as_ref()?;
        self.items
            .iter()
            .find(|c| c.id == active.id)
            .or(Some(active))
    }

    pub fn is_active(&self, conversation_id: &str) -> bool {
        self.active_id() == Some(conversation_id)
    }

    /// Replace the list. Selects the first item only when nothing is selected.
    ///
    /// Returns the id of the newly selected conversation, if any.
    fn replace(&mut self, items: Vec<Conversation>) -> Option<String> {
        self.items = items;
        if self.active.is_some() {
            return None;
        }
        let first = self.items.first()?.clone();
        let id = first.id.clone();
        self.active = Some(first);
        Some(id)
    }

    /// Make `conversation_id` active. Returns false if it was already active
    /// or is not in the list.
    fn select(&mut self, conversation_id: &str) -> bool {
        if self.is_active(conversation_id) {
            return false;
        }
        match self.items.iter().find(|c| c.id == conversation_id) {
            Some(conv) => {
                self.active = Some(conv.clone());
                true
            }
            None => false,
        }
    }

    /// Conversations whose person name contains `query`, case-insensitively.
    ///
    /// The stored list is left untouched.
    pub fn filtered(&self, query: &str) -> Vec<&Conversation> {
        self.items.iter().filter(|c| c.matches_name(query)).collect()
    }
}

/// Messages of the active conversation, in backend order.
#[derive(Debug, Default)]
pub struct MessageStore {
    conversation_id: Option<String>,
    items: Vec<Message>,
    /// Last fetch for the active conversation failed.
    failed: bool,
}

impl MessageStore {
    pub fn items(&self) -> &[Message] {
        &self.items
    }

    /// Conversation the stored messages belong to.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// True if the active conversation's most recent fetch failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn replace(&mut self, conversation_id: &str, items: Vec<Message>) {
        self.conversation_id = Some(conversation_id.to_string());
        self.items = items;
        self.failed = false;
    }

    fn clear(&mut self) {
        self.conversation_id = None;
        self.items.clear();
        self.failed = false;
    }
}

/// Result of applying a message fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagesOutcome {
    /// List replaced; the conversation should now be marked read.
    Applied,
    /// The fetch was for a conversation that is no longer active.
    Stale,
    /// The fetch failed; the previous list is still shown.
    Failed,
}

/// A send the caller should now perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub conversation_id: String,
    pub content: String,
}

/// Synchronized client state for one screen.
#[derive(Debug)]
pub struct SyncState {
    pub conversations: ConversationStore,
    pub messages: MessageStore,
    error: Option<(FetchKind, String)>,
    loading: bool,
    sending: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            conversations: ConversationStore::default(),
            messages: MessageStore::default(),
            error: None,
            loading: true,
            sending: false,
        }
    }
}

impl SyncState {
    /// True until the first conversation fetch completes.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Latest visible fetch failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|(_, text)| text.as_str())
    }

    /// Apply a conversation list fetch.
    ///
    /// Returns the id of a conversation that became active as a result.
    pub fn apply_conversations(
        &mut self,
        result: Result<Vec<Conversation>, ApiError>,
    ) -> Option<String> {
        self.loading = false;
        match result {
            Ok(items) => {
                tracing::debug!("Loaded {} conversations", items.len());
                self.clear_error(FetchKind::Conversations);
                self.conversations.replace(items)
            }
            Err(e) => {
                tracing::error!("Error loading conversations: {}", e);
                self.set_error(FetchKind::Conversations);
                None
            }
        }
    }

    /// Select a conversation from the list. The previous thread is cleared.
    ///
    /// Returns false if nothing changed.
    pub fn select(&mut self, conversation_id: &str) -> bool {
        if !self.conversations.select(conversation_id) {
            return false;
        }
        self.messages.clear();
        true
    }

    /// Apply a message fetch tagged with the conversation it was issued for.
    pub fn apply_messages(
        &mut self,
        conversation_id: &str,
        result: Result<Vec<Message>, ApiError>,
    ) -> MessagesOutcome {
        if !self.conversations.is_active(conversation_id) {
            tracing::debug!(
                "Discarding stale message fetch for {} (active: {:?})",
                conversation_id,
                self.conversations.active_id()
            );
            return MessagesOutcome::Stale;
        }

        match result {
            Ok(items) => {
                tracing::debug!("Loaded {} messages for {}", items.len(), conversation_id);
                self.messages.replace(conversation_id, items);
                self.clear_error(FetchKind::Messages);
                MessagesOutcome::Applied
            }
            Err(e) => {
                tracing::error!("Error loading messages: {}", e);
                self.messages.failed = true;
                self.set_error(FetchKind::Messages);
                MessagesOutcome::Failed
            }
        }
    }

    /// Start a send if the content is non-blank, a conversation is active and
    /// no other send is in flight.
    pub fn begin_send(&mut self, content: &str) -> Option<SendRequest> {
        if content.trim().is_empty() || self.sending {
            return None;
        }
        let conversation_id = self.conversations.active_id()?.to_string();
        self.sending = true;
        Some(SendRequest {
            conversation_id,
            content: content.to_string(),
        })
    }

    /// Finish the in-flight send. Failures are logged only.
    ///
    /// Returns true if the message was accepted by the backend.
    pub fn finish_send(&mut self, result: Result<Message, ApiError>) -> bool {
        self.sending = false;
        match result {
            Ok(message) => {
                tracing::info!("Message {} sent to {}", message.id, message.conversation_id());
                true
            }
            Err(e) => {
                tracing::warn!("Error sending message: {}", e);
                false
            }
        }
    }

    fn set_error(&mut self, kind: FetchKind) {
        self.error = Some((kind, kind.failure_text().to_string()));
    }

    fn clear_error(&mut self, kind: FetchKind) {
        if matches!(self.error, Some((k, _)) if k == kind) {
            self.error = None;
        }
    }
}
