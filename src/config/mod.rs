//! Environment-driven configuration.
//!
//! Everything here has a usable default; the app runs with zero configuration
//! (Google sign-in simply isn't offered until a client id is set).

use serde::{Deserialize, Serialize};

/// Session timeout when `SESSION_TIMEOUT_HOURS` is unset.
pub const DEFAULT_SESSION_TIMEOUT_HOURS: u64 = 24;

/// Redirect URI when `GOOGLE_REDIRECT_URI` is unset.
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8501";

/// Google OAuth settings. Presence of this config decides whether the
/// Google sign-in path is offered at all; the token exchange itself happens
/// in the front end, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleOauthConfig {
    pub client_id: String,
    pub redirect_uri: String,
}

impl GoogleOauthConfig {
    /// Consent-screen URL for the "Sign in with Google" button.
    pub fn authorization_url(&self) -> String {
        format!(
            "https://accounts.google.com/o/oauth2/v2/auth?\
             client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
        )
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hours an authenticated session stays valid.
    pub session_timeout_hours: u64,
    /// `Some` iff `GOOGLE_CLIENT_ID` is configured.
    pub google_oauth: Option<GoogleOauthConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_timeout_hours: DEFAULT_SESSION_TIMEOUT_HOURS,
            google_oauth: None,
        }
    }
}

impl Config {
    /// Read configuration from process environment variables:
    /// `SESSION_TIMEOUT_HOURS`, `GOOGLE_CLIENT_ID`, `GOOGLE_REDIRECT_URI`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Injected-lookup variant so tests don't mutate process-global env.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let session_timeout_hours = match get("SESSION_TIMEOUT_HOURS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(hours) => hours,
                Err(_) => {
                    tracing::warn!(
                        value = raw.as_str(),
                        "invalid SESSION_TIMEOUT_HOURS, using default"
                    );
                    DEFAULT_SESSION_TIMEOUT_HOURS
                }
            },
            None => DEFAULT_SESSION_TIMEOUT_HOURS,
        };

        let google_oauth = get("GOOGLE_CLIENT_ID")
            .filter(|id| !id.is_empty())
            .map(|client_id| GoogleOauthConfig {
                client_id,
                redirect_uri: get("GOOGLE_REDIRECT_URI")
                    .filter(|uri| !uri.is_empty())
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            });

        Self {
            session_timeout_hours,
            google_oauth,
        }
    }

    /// Whether the front end should show the Google sign-in option.
    pub fn google_sign_in_enabled(&self) -> bool {
        self.google_oauth.is_some()
    }
}
