use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal events fed into the conversation loop
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Periodic tick; drives reply polling and animations
    Tick,
}

/// Who authored a message, as written to exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationRole::User => "You",
            ConversationRole::Assistant => "Assistant",
        }
    }

    /// Presentation tag used by views (`user` / `bot`).
    pub fn tag(&self) -> &'static str {
        match self {
            ConversationRole::User => "user",
            ConversationRole::Assistant => "bot",
        }
    }

    pub fn from_user(from_user: bool) -> Self {
        if from_user {
            ConversationRole::User
        } else {
            ConversationRole::Assistant
        }
    }
}

/// A single transcript entry.
///
/// Messages are immutable once created: fields are only reachable through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: Uuid,
    content: String,
    from_user: bool,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Message typed by the user, stamped now
    pub fn user(content: impl Into<String>) -> Self {
        Self::restore(content, true, Utc::now())
    }

    /// Assistant or system message, stamped now
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::restore(content, false, Utc::now())
    }

    /// Rebuild a message with a known timestamp and a fresh id.
    pub fn restore(content: impl Into<String>, from_user: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            from_user,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn from_user(&self) -> bool {
        self.from_user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn role(&self) -> ConversationRole {
        ConversationRole::from_user(self.from_user)
    }
}

/// How an in-flight turn settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The provider answered and its reply was appended
    Replied,
    /// The provider failed and the fixed error entry was appended
    Failed,
}
