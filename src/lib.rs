//! mindline — backend core for a supportive-chat web application.
//!
//! Provides:
//! - Email/password authentication (PBKDF2-HMAC-SHA256, 100k rounds + per-account salt)
//! - Per-context session lifecycle with lazy 24h expiry
//! - Google sign-in account provisioning (consent-URL construction only)
//! - SQLite-backed user records, activity log, and chat history
//! - Placeholder chat responses until a model backend is wired in
//!
//! The web presentation layer lives elsewhere; this crate is everything beneath it.

pub mod auth;
pub mod chat;
pub mod config;
pub mod store;

pub use auth::error::AuthError;
pub use auth::session::{SessionContext, SessionInfo, SessionStatus};
pub use config::Config;
pub use store::{AuthMethod, EventKind, StoreError, UserRecord, UserStore};
