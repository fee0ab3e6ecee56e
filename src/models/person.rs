//! Person (contact) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The human contact on the other side of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The `person` field of a conversation: either populated inline or a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersonRef {
    Inline(Person),
    Reference(String),
}

impl PersonRef {
    /// Id of the referenced person, whichever form it arrived in.
    pub fn id(&self) -> &str {
        match self {
            PersonRef::Inline(person) => &person.id,
            PersonRef::Reference(id) => id,
        }
    }

    /// Name of the person, if the backend populated it.
    pub fn name(&self) -> Option<&str> {
        match self {
            PersonRef::Inline(person) => Some(&person.name),
            PersonRef::Reference(_) => None,
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            PersonRef::Inline(person) => Some(person),
            PersonRef::Reference(_) => None,
        }
    }
}
