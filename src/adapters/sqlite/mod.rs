//! SQLite adapter: Implementation of UserStore.
//!
//! Provides local persistence for user accounts and login sessions.
//!
//! # Security
//!
//! - Passwords are stored only as Argon2id PHC strings
//! - Session tokens are stored only as SHA-256 hashes; the raw token lives
//!   in the client's cookie
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional
//! for account data integrity.
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{NewUser, Session, User};
use crate::ports::UserStore;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cannot create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("An account with this {0} already exists")]
    Duplicate(&'static str),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// The parent directory is created if needed.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_expires
                ON sessions(expires_at);
            ",
        )?;

        Ok(())
    }

    /// Fixed-width timestamps so that string comparison in SQL is
    /// chronological.
    fn fmt_time(t: chrono::DateTime<chrono::Utc>) -> String {
        t.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }

    fn parse_time(s: &str) -> Result<chrono::DateTime<chrono::Utc>, StorageError> {
        chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| StorageError::Corrupt(format!("bad timestamp {s:?}: {e}")))
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn build_user(
        (id, username, email, password_hash, created_at): (i64, String, String, String, String),
    ) -> Result<User, StorageError> {
        Ok(User {
            id,
            username,
            email,
            password_hash,
            created_at: Self::parse_time(&created_at)?,
        })
    }

    fn find_user_where(&self, clause: &str, value: &dyn rusqlite::ToSql) -> Result<Option<User>, StorageError> {
        let conn = self.conn.lock().expect("Lock failed");
        let sql = format!(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE {clause}"
        );
        let raw = conn
            .query_row(&sql, params![value], Self::row_to_user)
            .optional()?;
        raw.map(Self::build_user).transpose()
    }
}

impl UserStore for SqliteStorage {
    type Error = StorageError;

    fn create_user(&self, user: &NewUser) -> Result<User, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let now = chrono::Utc::now();

        let email_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![user.email],
            |row| row.get(0),
        )?;
        if email_taken {
            return Err(StorageError::Duplicate("email"));
        }

        let name_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![user.username],
            |row| row.get(0),
        )?;
        if name_taken {
            return Err(StorageError::Duplicate("username"));
        }

        conn.execute(
            r"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![user.username, user.email, user.password_hash, Self::fmt_time(now)],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!("Created user {}", id);
        Ok(User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
        })
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Self::Error> {
        self.find_user_where("email = ?1", &email)
    }

    fn find_user_by_id(&self, id: i64) -> Result<Option<User>, Self::Error> {
        self.find_user_where("id = ?1", &id)
    }

    fn count_users(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        Ok(count as usize)
    }

    fn save_session(&self, session: &Session) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT OR REPLACE INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                session.token_hash,
                session.user_id,
                Self::fmt_time(session.created_at),
                Self::fmt_time(session.expires_at),
            ],
        )?;

        tracing::debug!("Saved session for user {}", session.user_id);
        Ok(())
    }

    fn find_session(&self, token_hash: &str) -> Result<Option<Session>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let raw = conn
            .query_row(
                "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?1",
                params![token_hash],
                |row| {
                    let token_hash: String = row.get(0)?;
                    let user_id: i64 = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    let expires_at: String = row.get(3)?;
                    Ok((token_hash, user_id, created_at, expires_at))
                },
            )
            .optional()?;

        raw.map(|(token_hash, user_id, created_at, expires_at)| {
            Ok(Session {
                token_hash,
                user_id,
                created_at: Self::parse_time(&created_at)?,
                expires_at: Self::parse_time(&expires_at)?,
            })
        })
        .transpose()
    }

    fn delete_session(&self, token_hash: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
        Ok(())
    }

    fn purge_expired_sessions(&self, now: chrono::DateTime<chrono::Utc>) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        // RFC 3339 UTC strings with the same offset compare lexicographically.
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![Self::fmt_time(now)],
        )?;
        if removed > 0 {
            tracing::info!("Purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}
