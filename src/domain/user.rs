//! User account and session types.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 20;

/// Longest accepted e-mail address, in characters.
pub const MAX_EMAIL_LEN: usize = 120;

/// A registered user.
///
/// `password_hash` is skipped on serialization so the record can be handed
/// to templates or logs without leaking the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Signup input after validation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Raw signup form.
#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("username", &self.username)
            .field("email", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl SignupForm {
    /// Validate the username and e-mail fields.
    ///
    /// Password strength is checked when hashing.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("Username is required".to_string());
        } else if username.chars().count() > MAX_USERNAME_LEN {
            errors.push(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            ));
        }

        let email = normalize_email(&self.email);
        if email.is_empty() {
            errors.push("Email is required".to_string());
        } else if email.chars().count() > MAX_EMAIL_LEN {
            errors.push(format!("Email must be at most {MAX_EMAIL_LEN} characters"));
        } else if !looks_like_email(&email) {
            errors.push("Email address is not valid".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Raw login form.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// E-mail addresses are compared case-insensitively and without
/// surrounding whitespace.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// A login session as stored server-side.
#[derive(Debug, Clone)]
pub struct Session {
    /// SHA-256 of the cookie token, hex encoded
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Opaque session token held by the client.
///
/// Only its hash is ever stored. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Generate a new random token (256 bits, URL-safe base64).
    ///
    /// Uses ChaCha20Rng seeded from OS entropy.
    #[must_use]
    pub fn generate() -> Self {
        use base64::Engine;
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha20Rng;

        let mut rng = ChaCha20Rng::from_entropy();
        let bytes: [u8; 32] = rng.gen();
        Self(Zeroizing::new(
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        ))
    }

    /// Wrap a token received from a cookie.
    #[must_use]
    pub fn from_cookie(value: &str) -> Option<Self> {
        let value = value.trim();
        let valid = !value.is_empty()
            && value.len() <= 128
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(Zeroizing::new(value.to_string())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Hash used as the storage key.
    #[must_use]
    pub fn hash(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}
