//! Account service: signup, login, logout and session resolution.
//!
//! Passwords are hashed with Argon2id before they reach storage. Logins
//! create a server-side session keyed by the hash of a random token; the raw
//! token is handed back to the caller to place in a cookie.

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::password::{self, PasswordError};
use crate::domain::{normalize_email, LoginForm, NewUser, Session, SessionToken, SignupForm, User};
use crate::ports::UserStore;

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("This email is already registered")]
    EmailTaken,

    #[error("This username is already taken")]
    UsernameTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session lifetime of {0} days runs past the supported date range")]
    SessionTtlOverflow(i64),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for AccountError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Duplicate("email") => Self::EmailTaken,
            StorageError::Duplicate("username") => Self::UsernameTaken,
            other => Self::Storage(other),
        }
    }
}

/// A successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub token: SessionToken,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Service for user accounts and sessions.
pub struct AccountService<S>
where
    S: UserStore,
{
    storage: Arc<S>,
    session_ttl: chrono::Duration,
}

impl<S> AccountService<S>
where
    S: UserStore,
    S::Error: Into<StorageError>,
{
    /// Create a new account service.
    pub fn new(storage: Arc<S>, session_ttl: chrono::Duration) -> Self {
        Self {
            storage,
            session_ttl,
        }
    }

    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        self.session_ttl
    }

    fn store<T>(result: Result<T, S::Error>) -> Result<T, AccountError> {
        result.map_err(|e| {
            let e: StorageError = e.into();
            AccountError::from(e)
        })
    }

    /// Register a new user.
    ///
    /// # Errors
    /// - `Invalid` for field validation failures
    /// - `EmailTaken` / `UsernameTaken` for duplicates
    /// - `Password` if the password is too short or hashing fails
    pub fn signup(&self, form: &SignupForm) -> Result<User, AccountError> {
        form.validate().map_err(AccountError::Invalid)?;

        let email = normalize_email(&form.email);
        if Self::store(self.storage.find_user_by_email(&email))?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = password::hash_password(&form.password)?;
        let user = Self::store(self.storage.create_user(&NewUser {
            username: form.username.trim().to_string(),
            email,
            password_hash,
        }))?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials and open a session.
    ///
    /// Unknown e-mail and wrong password both report `InvalidCredentials`.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` or a storage/password error.
    pub fn login(&self, form: &LoginForm) -> Result<LoginOutcome, AccountError> {
        let email = normalize_email(&form.email);
        let Some(user) = Self::store(self.storage.find_user_by_email(&email))? else {
            tracing::info!("Login failed: unknown account");
            return Err(AccountError::InvalidCredentials);
        };

        if !password::verify_password(&form.password, &user.password_hash)? {
            tracing::info!("Login failed for user {}", user.id);
            return Err(AccountError::InvalidCredentials);
        }

        let now = chrono::Utc::now();
        let expires_at = now
            .checked_add_signed(self.session_ttl)
            .ok_or(AccountError::SessionTtlOverflow(self.session_ttl.num_days()))?;

        let token = SessionToken::generate();
        let session = Session {
            token_hash: token.hash(),
            user_id: user.id,
            created_at: now,
            expires_at,
        };
        Self::store(self.storage.save_session(&session))?;

        tracing::info!("User {} logged in", user.id);
        Ok(LoginOutcome {
            user,
            token,
            expires_at: session.expires_at,
        })
    }

    /// End the session behind a token. Unknown tokens are ignored.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn logout(&self, token: &SessionToken) -> Result<(), AccountError> {
        Self::store(self.storage.delete_session(&token.hash()))
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted on sight and resolve to `None`.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn current_user(&self, token: &SessionToken) -> Result<Option<User>, AccountError> {
        let hash = token.hash();
        let Some(session) = Self::store(self.storage.find_session(&hash))? else {
            return Ok(None);
        };

        if session.is_expired(chrono::Utc::now()) {
            tracing::debug!("Session for user {} expired", session.user_id);
            Self::store(self.storage.delete_session(&hash))?;
            return Ok(None);
        }

        Self::store(self.storage.find_user_by_id(session.user_id))
    }

    /// Remove all expired sessions.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn purge_expired_sessions(&self) -> Result<usize, AccountError> {
        let removed = Self::store(self.storage.purge_expired_sessions(chrono::Utc::now()))?;
        if removed > 0 {
            tracing::info!("Purged {} expired session(s)", removed);
        }
        Ok(removed)
    }

    /// Number of registered users.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn user_count(&self) -> Result<usize, AccountError> {
        Self::store(self.storage.count_users())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use zeroize::Zeroizing;

    fn create_test_service(ttl: chrono::Duration) -> AccountService<SqliteStorage> {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        AccountService::new(storage, ttl)
    }

    fn signup_form(username: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: email.to_string(),
            password: Zeroizing::new(password.to_string()),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: Zeroizing::new(password.to_string()),
        }
    }

    #[test]
    fn test_signup_login_logout() {
        let service = create_test_service(chrono::Duration::days(30));

        let user = service
            .signup(&signup_form("asha", " Asha@Example.com ", "long-enough-pw"))
            .expect("Should sign up");
        assert_eq!(user.email, "asha@example.com");
        assert_eq!(service.user_count().expect("Should count"), 1);

        let outcome = service
            .login(&login_form("ASHA@example.com", "long-enough-pw"))
            .expect("Should log in");
        assert_eq!(outcome.user.id, user.id);

        let current = service
            .current_user(&outcome.token)
            .expect("Should resolve")
            .expect("Session should be valid");
        assert_eq!(current.username, "asha");

        service.logout(&outcome.token).expect("Should log out");
        assert!(service
            .current_user(&outcome.token)
            .expect("Should resolve")
            .is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let service = create_test_service(chrono::Duration::days(30));
        service
            .signup(&signup_form("one", "dup@example.com", "long-enough-pw"))
            .expect("Should sign up");

        let result = service.signup(&signup_form("two", "DUP@example.com", "long-enough-pw"));
        assert!(matches!(result, Err(AccountError::EmailTaken)));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let service = create_test_service(chrono::Duration::days(30));
        service
            .signup(&signup_form("same", "a@example.com", "long-enough-pw"))
            .expect("Should sign up");

        let result = service.signup(&signup_form("same", "b@example.com", "long-enough-pw"));
        assert!(matches!(result, Err(AccountError::UsernameTaken)));
    }

    #[test]
    fn test_signup_validation() {
        let service = create_test_service(chrono::Duration::days(30));

        let result = service.signup(&signup_form("", "not-an-email", "long-enough-pw"));
        match result {
            Err(AccountError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected Invalid, got {other:?}"),
        }

        let result = service.signup(&signup_form("bob", "bob@example.com", "short"));
        assert!(matches!(
            result,
            Err(AccountError::Password(PasswordError::TooShort))
        ));
        assert_eq!(service.user_count().expect("Should count"), 0);
    }

    #[test]
    fn test_bad_credentials() {
        let service = create_test_service(chrono::Duration::days(30));
        service
            .signup(&signup_form("carol", "carol@example.com", "long-enough-pw"))
            .expect("Should sign up");

        assert!(matches!(
            service.login(&login_form("carol@example.com", "wrong-password")),
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(&login_form("nobody@example.com", "long-enough-pw")),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let service = create_test_service(chrono::Duration::seconds(-1));
        service
            .signup(&signup_form("dave", "dave@example.com", "long-enough-pw"))
            .expect("Should sign up");
        let outcome = service
            .login(&login_form("dave@example.com", "long-enough-pw"))
            .expect("Should log in");

        assert!(service
            .current_user(&outcome.token)
            .expect("Should resolve")
            .is_none());
        assert_eq!(service.purge_expired_sessions().expect("Should purge"), 0);
    }

    #[test]
    fn test_login_with_out_of_range_ttl_errors() {
        let service = create_test_service(chrono::Duration::days(100_000_000));
        service
            .signup(&signup_form("asha", "asha@example.com", "long-enough-pw"))
            .expect("Should sign up");

        let result = service.login(&login_form("asha@example.com", "long-enough-pw"));
        assert!(matches!(
            result,
            Err(AccountError::SessionTtlOverflow(100_000_000))
        ));
    }

    #[test]
    fn test_unknown_token_resolves_to_none() {
        let service = create_test_service(chrono::Duration::days(30));
        let token = SessionToken::generate();
        assert!(service.current_user(&token).expect("Should resolve").is_none());
        service.logout(&token).expect("Should ignore unknown token");
    }
}
