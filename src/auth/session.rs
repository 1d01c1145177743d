//! Per-context session state machine.
//!
//! A [`SessionContext`] belongs to exactly one caller context (one browser
//! connection's request lifetime) and is never shared between users or
//! threads. Two states exist: Anonymous (no session) and Authenticated
//! (session present and not past the timeout). Expiry is detected lazily on
//! the next [`SessionContext::check_session`] call — wall-clock arithmetic,
//! no timers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::credentials;
use crate::auth::error::AuthError;
use crate::config::Config;
use crate::store::{AuthMethod, EventKind, StoreError, UserRecord, UserStore};

/// Reason string reported when a session times out.
const EXPIRED_REASON: &str = "expired";

/// Live session data. Exists only while the context is Authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub email: String,
    pub name: String,
    pub auth_method: AuthMethod,
    pub login_time: DateTime<Utc>,
}

/// Snapshot returned to the caller on successful sign-in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionInfo {
    pub email: String,
    pub name: String,
    pub auth_method: AuthMethod,
    pub login_time: DateTime<Utc>,
}

/// Result of a session check.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Authenticated {
        email: String,
        name: String,
        auth_method: AuthMethod,
    },
    Anonymous {
        /// `Some("expired")` when this check detected a timeout.
        reason: Option<String>,
    },
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Credential payload handed back by the Google OAuth front end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleCredentials {
    pub email: Option<String>,
    pub name: Option<String>,
    /// Google subject id; carried through but not used for lookups.
    pub id: Option<String>,
}

/// One caller context's view of authentication state.
pub struct SessionContext {
    store: Arc<dyn UserStore>,
    timeout: Duration,
    session: Option<Session>,
}

impl SessionContext {
    /// New context in the Anonymous state. Absurdly large configured
    /// timeouts saturate instead of panicking.
    pub fn new(store: Arc<dyn UserStore>, config: &Config) -> Self {
        let hours = i64::try_from(config.session_timeout_hours).unwrap_or(i64::MAX);
        Self {
            store,
            timeout: Duration::try_hours(hours).unwrap_or(Duration::MAX),
            session: None,
        }
    }

    /// Register a new account. Does NOT sign the caller in — signup and
    /// login are separate actions.
    pub fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<(), AuthError> {
        match self.store.get_user(email) {
            Ok(Some(_)) => return Err(AuthError::DuplicateAccount),
            Ok(None) => {}
            Err(err) => return Err(store_unavailable(err)),
        }

        credentials::validate_signup(email, password)?;

        let derived = credentials::derive_hash(password, None);
        let record = UserRecord {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: derived.hash,
            salt: derived.salt,
            auth_method: AuthMethod::Custom,
            created_at: Utc::now(),
        };

        match self.store.put_user(&record) {
            Ok(()) => Ok(()),
            // The existence check above is racy; the store's uniqueness
            // constraint is the real guarantee.
            Err(StoreError::DuplicateEmail(_)) => Err(AuthError::DuplicateAccount),
            Err(err) => Err(store_unavailable(err)),
        }
    }

    /// Authenticate with email + password. Unknown email and wrong password
    /// return the identical error.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<SessionInfo, AuthError> {
        let record = match self.store.get_user(email) {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Level timing with the wrong-password path.
                credentials::dummy_derive(password);
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(store_unavailable(err)),
        };

        if !credentials::verify(password, &record.password_hash, &record.salt) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.begin_session(record.email, record.name, AuthMethod::Custom))
    }

    /// Authenticate with a Google credential payload. Creates the account on
    /// first login (empty hash/salt, method `google`).
    pub fn sign_in_with_google(
        &mut self,
        credentials: &GoogleCredentials,
    ) -> Result<SessionInfo, AuthError> {
        let email = match credentials.email.as_deref() {
            Some(e) if !e.is_empty() => e,
            _ => return Err(AuthError::InvalidOAuthPayload),
        };
        let name = match credentials.name.as_deref() {
            Some(n) if !n.is_empty() => n,
            _ => return Err(AuthError::InvalidOAuthPayload),
        };

        let name = match self.store.get_user(email) {
            Ok(Some(record)) => record.name,
            Ok(None) => {
                let record = UserRecord {
                    email: email.to_string(),
                    name: name.to_string(),
                    password_hash: String::new(),
                    salt: String::new(),
                    auth_method: AuthMethod::Google,
                    created_at: Utc::now(),
                };
                match self.store.put_user(&record) {
                    Ok(()) => {}
                    // Concurrent first login created the record between our
                    // lookup and insert; it exists, which is all we need.
                    Err(StoreError::DuplicateEmail(_)) => {}
                    Err(err) => return Err(store_unavailable(err)),
                }
                name.to_string()
            }
            Err(err) => return Err(store_unavailable(err)),
        };

        Ok(self.begin_session(email.to_string(), name, AuthMethod::Google))
    }

    /// Report the current state, expiring the session first if it has
    /// outlived the timeout.
    pub fn check_session(&mut self) -> SessionStatus {
        match &self.session {
            None => return SessionStatus::Anonymous { reason: None },
            Some(session) => {
                if Utc::now() - session.login_time <= self.timeout {
                    return SessionStatus::Authenticated {
                        email: session.email.clone(),
                        name: session.name.clone(),
                        auth_method: session.auth_method,
                    };
                }
            }
        }

        // Past the timeout: equivalent to an explicit logout, audit included.
        self.sign_out();
        SessionStatus::Anonymous {
            reason: Some(EXPIRED_REASON.to_string()),
        }
    }

    /// Clear the session. Safe to call when already Anonymous.
    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            self.audit(&session.email, EventKind::Logout, serde_json::json!({}));
        }
    }

    fn begin_session(&mut self, email: String, name: String, auth_method: AuthMethod) -> SessionInfo {
        let session = Session {
            email,
            name,
            auth_method,
            login_time: Utc::now(),
        };
        let info = SessionInfo {
            email: session.email.clone(),
            name: session.name.clone(),
            auth_method,
            login_time: session.login_time,
        };
        self.audit(
            &session.email,
            EventKind::Login,
            serde_json::json!({ "auth_method": auth_method.as_str() }),
        );
        self.session = Some(session);
        info
    }

    /// Best-effort audit emission. Failures never change the outcome of the
    /// operation that triggered them.
    fn audit(&self, email: &str, kind: EventKind, metadata: serde_json::Value) {
        if let Err(err) = self.store.record_event(email, kind, metadata) {
            tracing::debug!(email, kind = kind.as_str(), error = %err, "activity event dropped");
        }
    }
}

fn store_unavailable(err: StoreError) -> AuthError {
    tracing::warn!(error = %err, "user store unavailable");
    AuthError::StoreUnavailable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_context() -> (Arc<MemoryStore>, SessionContext) {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::new(store.clone(), &Config::default());
        (store, ctx)
    }

    fn google_payload(email: &str, name: &str) -> GoogleCredentials {
        GoogleCredentials {
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            id: Some("sub-123".to_string()),
        }
    }

    #[test]
    fn sign_up_then_sign_in_end_to_end() {
        let (_store, mut ctx) = test_context();

        ctx.sign_up("child@example.com", "password1", "Child").unwrap();

        let info = ctx.sign_in("child@example.com", "password1").unwrap();
        assert_eq!(info.name, "Child");
        assert_eq!(info.auth_method, AuthMethod::Custom);

        match ctx.check_session() {
            SessionStatus::Authenticated { email, name, .. } => {
                assert_eq!(email, "child@example.com");
                assert_eq!(name, "Child");
            }
            other => panic!("expected authenticated, got {other:?}"),
        }

        assert_eq!(
            ctx.sign_in("child@example.com", "wrongpass"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn sign_up_does_not_authenticate() {
        let (_store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();
        assert!(!ctx.check_session().is_authenticated());
    }

    #[test]
    fn duplicate_sign_up_fails_regardless_of_password() {
        let (_store, ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();

        assert_eq!(
            ctx.sign_up("a@example.com", "password1", "A"),
            Err(AuthError::DuplicateAccount)
        );
        assert_eq!(
            ctx.sign_up("a@example.com", "completely-different", "B"),
            Err(AuthError::DuplicateAccount)
        );
        // Idempotent: still a duplicate on repeat
        assert_eq!(
            ctx.sign_up("a@example.com", "password1", "A"),
            Err(AuthError::DuplicateAccount)
        );
    }

    #[test]
    fn sign_up_validation_errors() {
        let (_store, ctx) = test_context();
        assert_eq!(
            ctx.sign_up("a@b", "short", "A"),
            Err(AuthError::WeakPassword)
        );
        assert_eq!(
            ctx.sign_up("not-an-email", "longenough1", "A"),
            Err(AuthError::InvalidEmail)
        );
    }

    #[test]
    fn wrong_password_and_unknown_email_are_indistinguishable() {
        let (_store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();

        let wrong_password = ctx.sign_in("a@example.com", "not-the-password").unwrap_err();
        let unknown_email = ctx.sign_in("ghost@example.com", "password1").unwrap_err();

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[test]
    fn session_expires_after_timeout() {
        let (store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();
        ctx.sign_in("a@example.com", "password1").unwrap();

        // Simulate a login 25 hours ago.
        let session = ctx.session.as_mut().unwrap();
        session.login_time = session.login_time - Duration::hours(25);

        match ctx.check_session() {
            SessionStatus::Anonymous { reason } => {
                assert_eq!(reason.as_deref(), Some("expired"))
            }
            other => panic!("expected expired, got {other:?}"),
        }

        // Forced expiry behaves like logout, audit included.
        let events = store.events();
        assert_eq!(events.last().unwrap().kind, EventKind::Logout);

        // Subsequent checks report plain Anonymous.
        assert_eq!(ctx.check_session(), SessionStatus::Anonymous { reason: None });
    }

    #[test]
    fn session_survives_within_timeout() {
        let (_store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();
        ctx.sign_in("a@example.com", "password1").unwrap();

        let session = ctx.session.as_mut().unwrap();
        session.login_time = session.login_time - Duration::hours(23);

        assert!(ctx.check_session().is_authenticated());
        assert!(ctx.session.is_some());
    }

    #[test]
    fn oversized_timeout_saturates_instead_of_panicking() {
        let store = Arc::new(MemoryStore::new());
        let config = Config {
            session_timeout_hours: u64::MAX,
            google_oauth: None,
        };
        let mut ctx = SessionContext::new(store, &config);

        ctx.sign_up("a@example.com", "password1", "A").unwrap();
        ctx.sign_in("a@example.com", "password1").unwrap();
        assert!(ctx.check_session().is_authenticated());
    }

    #[test]
    fn sign_out_is_idempotent() {
        let (store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();
        ctx.sign_in("a@example.com", "password1").unwrap();

        ctx.sign_out();
        assert!(!ctx.check_session().is_authenticated());
        ctx.sign_out();
        ctx.sign_out();

        // Exactly one logout event despite repeated calls.
        let logouts = store
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::Logout)
            .count();
        assert_eq!(logouts, 1);
    }

    #[test]
    fn login_and_logout_are_audited() {
        let (store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();
        ctx.sign_in("a@example.com", "password1").unwrap();
        ctx.sign_out();

        let events = store.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Login);
        assert_eq!(events[0].metadata["auth_method"], "custom");
        assert_eq!(events[1].kind, EventKind::Logout);
        assert_eq!(events[1].email, "a@example.com");
    }

    #[test]
    fn audit_failures_never_fail_the_operation() {
        let (store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "A").unwrap();

        store.set_fail_events(true);
        let info = ctx.sign_in("a@example.com", "password1").unwrap();
        assert_eq!(info.email, "a@example.com");
        ctx.sign_out();
        assert!(!ctx.check_session().is_authenticated());
        assert!(store.events().is_empty());
    }

    #[test]
    fn store_outage_surfaces_as_store_unavailable() {
        let (store, mut ctx) = test_context();
        store.set_offline(true);

        assert_eq!(
            ctx.sign_up("a@example.com", "password1", "A"),
            Err(AuthError::StoreUnavailable)
        );
        assert_eq!(
            ctx.sign_in("a@example.com", "password1"),
            Err(AuthError::StoreUnavailable)
        );
    }

    #[test]
    fn google_sign_in_creates_account_on_first_login() {
        let (store, mut ctx) = test_context();

        let info = ctx
            .sign_in_with_google(&google_payload("g@example.com", "G User"))
            .unwrap();
        assert_eq!(info.auth_method, AuthMethod::Google);
        assert!(ctx.check_session().is_authenticated());

        let record = store.get_user("g@example.com").unwrap().unwrap();
        assert_eq!(record.auth_method, AuthMethod::Google);
        assert!(record.password_hash.is_empty());
        assert!(record.salt.is_empty());

        let events = store.events();
        assert_eq!(events.last().unwrap().metadata["auth_method"], "google");
    }

    #[test]
    fn google_sign_in_reuses_existing_account() {
        let (store, mut ctx) = test_context();
        ctx.sign_up("a@example.com", "password1", "Stored Name").unwrap();

        let info = ctx
            .sign_in_with_google(&google_payload("a@example.com", "Payload Name"))
            .unwrap();
        // Stored record wins over whatever the payload claims.
        assert_eq!(info.name, "Stored Name");

        // No second record was created.
        let record = store.get_user("a@example.com").unwrap().unwrap();
        assert_eq!(record.auth_method, AuthMethod::Custom);
    }

    #[test]
    fn google_sign_in_rejects_incomplete_payload() {
        let (_store, mut ctx) = test_context();

        let missing_name = GoogleCredentials {
            email: Some("g@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ctx.sign_in_with_google(&missing_name),
            Err(AuthError::InvalidOAuthPayload)
        );

        let empty_email = GoogleCredentials {
            email: Some(String::new()),
            name: Some("G".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ctx.sign_in_with_google(&empty_email),
            Err(AuthError::InvalidOAuthPayload)
        );
        assert!(!ctx.check_session().is_authenticated());
    }

    #[test]
    fn password_sign_in_to_oauth_only_account_fails() {
        let (_store, mut ctx) = test_context();
        ctx.sign_in_with_google(&google_payload("g@example.com", "G"))
            .unwrap();
        ctx.sign_out();

        // OAuth-only records have empty hash/salt; any password must fail.
        assert_eq!(
            ctx.sign_in("g@example.com", "password1"),
            Err(AuthError::InvalidCredentials)
        );
    }
}
