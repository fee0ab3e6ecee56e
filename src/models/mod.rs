//! Data models for backend entities

mod conversation;
mod message;
mod person;

pub use conversation::*;
pub use message::*;
pub use person::*;
