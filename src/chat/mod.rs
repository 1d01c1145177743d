//! Chat session history.
//!
//! A [`ChatLog`] holds the in-context message list for the conversation the
//! user currently has open. Persistence is explicit: `save` writes the whole
//! log through a [`ChatStore`], `load` replaces the log with a stored chat.

pub mod responder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{EventKind, StoreError, UserStore};

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Summary row for the chat picker sidebar.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatSummary {
    pub chat_id: String,
    pub last_activity: DateTime<Utc>,
}

/// Chat persistence contract.
pub trait ChatStore: Send + Sync {
    fn save_message(
        &self,
        email: &str,
        chat_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError>;

    /// Messages of one chat, oldest first.
    fn chat_history(&self, email: &str, chat_id: &str) -> Result<Vec<ChatMessage>, StoreError>;

    /// One summary per chat id, newest activity first.
    fn list_chats(&self, email: &str) -> Result<Vec<ChatSummary>, StoreError>;

    fn delete_chat(&self, email: &str, chat_id: &str) -> Result<(), StoreError>;
}

/// The conversation currently open in one caller context.
#[derive(Debug, Clone)]
pub struct ChatLog {
    chat_id: String,
    messages: Vec<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    /// Start a fresh conversation with a timestamp-derived id.
    pub fn new() -> Self {
        Self {
            chat_id: Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            messages: Vec::new(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a message.
    pub fn add(&mut self, role: Role, content: &str) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// Drop all messages and start a new conversation id.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Persist every message of this log, then emit a best-effort
    /// `chat_saved` activity event.
    pub fn save<S>(&self, store: &S, email: &str) -> Result<(), StoreError>
    where
        S: ChatStore + UserStore + ?Sized,
    {
        if self.messages.is_empty() {
            return Ok(());
        }

        for message in &self.messages {
            store.save_message(email, &self.chat_id, message)?;
        }

        if let Err(err) = store.record_event(
            email,
            EventKind::ChatSaved,
            serde_json::json!({
                "chat_id": self.chat_id,
                "message_count": self.messages.len(),
            }),
        ) {
            tracing::debug!(email, error = %err, "chat_saved event dropped");
        }

        Ok(())
    }

    /// Replace this log with a previously saved chat.
    pub fn load<S>(store: &S, email: &str, chat_id: &str) -> Result<Self, StoreError>
    where
        S: ChatStore + ?Sized,
    {
        let messages = store.chat_history(email, chat_id)?;
        Ok(Self {
            chat_id: chat_id.to_string(),
            messages,
        })
    }
}
