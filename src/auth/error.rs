//! Auth error kinds. Display strings are user-facing; the presentation layer
//! renders them verbatim, so store failures never leak internal detail here
//! (that goes to the log at the point of conversion).

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Email has no `@`, or the domain segment has no `.`.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// Password shorter than 8 characters.
    #[error("Password must be at least 8 characters long")]
    WeakPassword,

    /// Signup attempted for an email that already has an account.
    #[error("An account with this email already exists")]
    DuplicateAccount,

    /// Unknown email OR wrong password — deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Google credential payload missing email or name.
    #[error("Failed to retrieve Google account information")]
    InvalidOAuthPayload,

    /// The user-record store could not complete the operation.
    #[error("Account service is temporarily unavailable. Please try again.")]
    StoreUnavailable,
}
