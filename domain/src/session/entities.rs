//! Conversation entities handed to the completion boundary

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

/// A role-tagged block of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The unit handed to the inference boundary: a system instruction followed
/// by a single user message.
///
/// Built fresh for every call and never mutated afterwards, so it only
/// exposes read accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    messages: [Message; 2],
}

impl Conversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: [Message::system(system), Message::user(user)],
        }
    }

    pub fn system(&self) -> &str {
        &self.messages[0].content
    }

    pub fn user(&self) -> &str {
        &self.messages[1].content
    }

    /// Messages in send order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// System and user text concatenated, as recorded in transcripts
    pub fn prompt_text(&self) -> String {
        format!("{}{}", self.system(), self.user())
    }
}
