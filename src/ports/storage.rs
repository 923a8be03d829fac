//! Storage port: Trait for persistent account storage.
//!
//! This trait abstracts the storage backend (SQLite) from the account service.
//! The prediction pipeline never touches it.

use crate::domain::{NewUser, Session, User};

/// Trait for user and session persistence.
pub trait UserStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a new user and return the stored record.
    ///
    /// # Errors
    /// Returns error if the e-mail or username is already taken, or the
    /// storage operation fails.
    fn create_user(&self, user: &NewUser) -> Result<User, Self::Error>;

    /// Look up a user by normalized e-mail.
    ///
    /// # Returns
    /// `None` if no user has this e-mail.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Self::Error>;

    /// Look up a user by id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn find_user_by_id(&self, id: i64) -> Result<Option<User>, Self::Error>;

    /// Number of registered users.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_users(&self) -> Result<usize, Self::Error>;

    /// Persist a session.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_session(&self, session: &Session) -> Result<(), Self::Error>;

    /// Load a session by token hash, expired or not.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn find_session(&self, token_hash: &str) -> Result<Option<Session>, Self::Error>;

    /// Delete a session by token hash. Deleting a missing session is not an error.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_session(&self, token_hash: &str) -> Result<(), Self::Error>;

    /// Delete sessions that expired before `now`; returns how many were removed.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn purge_expired_sessions(&self, now: chrono::DateTime<chrono::Utc>) -> Result<usize, Self::Error>;
}
