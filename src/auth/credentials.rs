//! Password hashing and signup validation.
//!
//! Pure functions over their inputs; no store access, no session state.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::auth::error::AuthError;

/// Salt byte length before hex encoding (32 bytes = 256-bit).
const SALT_BYTES: usize = 32;

/// Derived key length in bytes.
const KEY_BYTES: usize = 32;

/// PBKDF2 iteration count. Minimum acceptable work factor; raise, never lower.
const KDF_ITERATIONS: u32 = 100_000;

/// Result of deriving a password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPassword {
    /// Hex-encoded PBKDF2-HMAC-SHA256 output.
    pub hash: String,
    /// Hex-encoded salt the hash was derived with.
    pub salt: String,
}

/// Derive a password hash. Generates a fresh random salt when none is given.
pub fn derive_hash(password: &str, salt: Option<&str>) -> DerivedPassword {
    let salt = match salt {
        Some(s) => s.to_string(),
        None => generate_salt(),
    };

    let mut key = [0u8; KEY_BYTES];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        KDF_ITERATIONS,
        &mut key,
    );

    DerivedPassword {
        hash: hex::encode(key),
        salt,
    }
}

/// Verify a password against a stored hash + salt.
pub fn verify(password: &str, hash: &str, salt: &str) -> bool {
    let derived = derive_hash(password, Some(salt));
    constant_time_eq(derived.hash.as_bytes(), hash.as_bytes())
}

/// Validate signup inputs. Password length is checked first, then a minimal
/// syntactic email check (not RFC 5322): there must be an `@`, and the
/// segment after the first `@` must contain a `.`.
pub fn validate_signup(email: &str, password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::WeakPassword);
    }
    let domain = email.split('@').nth(1).ok_or(AuthError::InvalidEmail)?;
    if !domain.contains('.') {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

/// Run the KDF against a throwaway salt. Used to keep the unknown-email
/// sign-in path as slow as the wrong-password path.
pub(crate) fn dummy_derive(password: &str) {
    let _ = derive_hash(password, Some("0000000000000000"));
}

/// Generate a random salt (hex-encoded).
fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
