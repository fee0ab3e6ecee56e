//! Conversation/message synchronization: stores, polling and day grouping.

mod engine;
pub mod grouping;
mod poll;
mod state;

#[cfg(test)]
pub(crate) mod fake;

pub use engine::{SyncEngine, SyncEvent, SyncEvents, SyncUpdate};
pub use state::{ConversationStore, SyncState};
