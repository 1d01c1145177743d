//! User-record store contract and implementations.
//!
//! The auth layer treats the store as an opaque record service with three
//! operations: insert-or-fail user creation, lookup by email, and a
//! fire-and-forget activity sink. Email uniqueness is enforced HERE, at the
//! storage layer — the application-level existence check in signup is only a
//! fast path and cannot be trusted under concurrent requests.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// How an account authenticates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Email + password, hashed locally.
    Custom,
    /// Google OAuth; no local password material.
    Google,
}

impl AuthMethod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Custom => "custom",
            Self::Google => "google",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "google" => Self::Google,
            _ => Self::Custom,
        }
    }
}

/// One registered account. Written once at signup (or first Google login),
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Unique identifier, case-sensitive as stored.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Hex-encoded derived key; empty for OAuth-only accounts.
    pub password_hash: String,
    /// Hex-encoded per-account salt; empty for OAuth-only accounts.
    pub salt: String,
    pub auth_method: AuthMethod,
    pub created_at: DateTime<Utc>,
}

/// Audit event categories recorded to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Login,
    Logout,
    ChatSaved,
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::ChatSaved => "chat_saved",
        }
    }
}

/// Store-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert rejected by the uniqueness constraint on `email`.
    #[error("an account with email '{0}' already exists")]
    DuplicateEmail(String),
    /// The store could not be reached or the operation failed outright.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Minimum store contract the auth core depends on.
pub trait UserStore: Send + Sync {
    /// Insert a new user record. Fails with [`StoreError::DuplicateEmail`]
    /// if a record with the same email already exists.
    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Look up a user by exact email.
    fn get_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Append an activity event. Callers treat this as best-effort and
    /// discard failures.
    fn record_event(
        &self,
        email: &str,
        kind: EventKind,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError>;
}
