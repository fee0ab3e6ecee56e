//! API client module for the chat backend

pub mod client;
mod commands;
mod error;

use std::future::Future;

use crate::models::{Conversation, Message};

pub use client::ChatClient;
pub use commands::{list_conversations, mark_read, read_messages, send_message};
pub use error::ApiError;

/// The four backend operations the client depends on.
///
/// Each call issues exactly one HTTP request and either yields a fully decoded
/// value or an [`ApiError`].
pub trait ChatApi: Send + Sync + 'static {
    /// `GET /api/conversations`, in backend order.
    fn list_conversations(
        &self,
    ) -> impl Future<Output = Result<Vec<Conversation>, ApiError>> + Send;

    /// `GET /api/conversations/{id}/messages`, in backend order.
    fn list_messages(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<Message>, ApiError>> + Send;

    /// `POST /api/conversations/{id}/messages` with `{ "content": .. }`.
    fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> impl Future<Output = Result<Message, ApiError>> + Send;

    /// `PATCH /api/conversations/{id}/read`. The response body is ignored.
    fn mark_read(&self, conversation_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}
