//! Password hashing for user accounts.
//!
//! This module provides:
//! - Argon2id hashing into self-describing PHC strings
//! - Constant-time verification against a stored hash
//!
//! # Security
//!
//! - Uses Argon2id (memory-hard, resistant to GPU/ASIC attacks)
//! - Random salt per hash from the OS RNG
//! - Parameters are embedded in the PHC string, so hashes created with older
//!   parameters keep verifying after a parameter change

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Errors during password hashing or verification.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Stored password hash is malformed")]
    InvalidFormat,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(47104, 1, 1, Some(32))
        .map_err(|e| PasswordError::Hashing(format!("Invalid Argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password for storage.
///
/// # Errors
/// Returns `PasswordError::TooShort` for short passwords, or
/// `PasswordError::Hashing` if Argon2 fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash.
///
/// # Errors
/// Returns `PasswordError::InvalidFormat` if the stored hash cannot be parsed.
/// A wrong password is `Ok(false)`, not an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::InvalidFormat)?;

    match hasher()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hashing(e.to_string())),
    }
}
