//! Account authentication and session lifecycle.
//!
//! Provides:
//! - Password hashing/verification (PBKDF2-HMAC-SHA256, 100k rounds + per-account salt)
//! - Signup validation (minimal email syntax check, 8-character password floor)
//! - Per-context session state machine with lazy wall-clock expiry
//! - Best-effort login/logout audit events
//!
//! ## Design Decisions
//! - Sessions live in an explicit [`session::SessionContext`] owned by one
//!   request context, never in process-global state.
//! - Unknown-email and wrong-password sign-ins return the same error so
//!   account existence cannot be probed.
//! - Password comparison is constant-time even though hash length is public.

pub mod credentials;
pub mod error;
pub mod session;

pub use error::AuthError;
pub use session::{Session, SessionContext, SessionInfo, SessionStatus};
