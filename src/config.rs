//! Runtime configuration from command-line flags and `SYMPTOMCHECK_*` variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Longest accepted session lifetime, in days.
pub const MAX_SESSION_DAYS: u32 = 3650;

/// Errors in a parsed configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Session lifetime must be at least one day")]
    ZeroSessionTtl,

    #[error("Session lifetime must be at most {MAX_SESSION_DAYS} days, got {0}")]
    SessionTtlTooLong(u32),

    #[error("Model digest pin must be 64 hex characters, got {0:?}")]
    BadDigest(String),
}

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "symptomcheck",
    about = "Symptom-based disease lookup with user accounts"
)]
pub struct AppConfig {
    /// Address to listen on
    #[arg(long, env = "SYMPTOMCHECK_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory holding the reference CSV tables
    #[arg(long, env = "SYMPTOMCHECK_DATASETS_DIR", default_value = "datasets")]
    pub datasets_dir: PathBuf,

    /// Directory holding the model artifact (svc.json)
    #[arg(long, env = "SYMPTOMCHECK_MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// SQLite database file for accounts
    #[arg(long, env = "SYMPTOMCHECK_DATABASE", default_value = "data/site.db")]
    pub database: PathBuf,

    /// Login session lifetime in days
    #[arg(long, env = "SYMPTOMCHECK_SESSION_DAYS", default_value_t = 30)]
    pub session_days: u32,

    /// Mark cookies `Secure` (serve behind HTTPS)
    #[arg(long, env = "SYMPTOMCHECK_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Expected SHA-256 of the model artifact
    #[arg(long, env = "SYMPTOMCHECK_MODEL_SHA256")]
    pub model_sha256: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            datasets_dir: PathBuf::from("datasets"),
            models_dir: PathBuf::from("models"),
            database: PathBuf::from("data/site.db"),
            session_days: 30,
            secure_cookies: false,
            model_sha256: None,
        }
    }
}

impl AppConfig {
    /// Validate settings that clap cannot check on its own.
    ///
    /// # Errors
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_days == 0 {
            return Err(ConfigError::ZeroSessionTtl);
        }
        if self.session_days > MAX_SESSION_DAYS {
            return Err(ConfigError::SessionTtlTooLong(self.session_days));
        }

        if let Some(pin) = self.model_pin() {
            if pin.len() != 64 || !pin.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::BadDigest(pin.to_string()));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.session_days))
    }

    /// The digest pin, ignoring an empty value.
    #[must_use]
    pub fn model_pin(&self) -> Option<&str> {
        self.model_sha256
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::try_parse_from(["symptomcheck"]).expect("Should parse");
        assert_eq!(config.bind.port(), 5000);
        assert_eq!(config.session_days, 30);
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl(), chrono::Duration::days(30));
    }

    #[test]
    fn test_flags() {
        let config = AppConfig::try_parse_from([
            "symptomcheck",
            "--bind",
            "0.0.0.0:8080",
            "--datasets-dir",
            "/srv/data",
            "--secure-cookies",
            "--session-days",
            "7",
        ])
        .expect("Should parse");
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.datasets_dir, PathBuf::from("/srv/data"));
        assert!(config.secure_cookies);
        assert_eq!(config.session_days, 7);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = AppConfig {
            session_days: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSessionTtl));
    }

    #[test]
    fn test_validate_rejects_huge_ttl() {
        let at_limit = AppConfig {
            session_days: MAX_SESSION_DAYS,
            ..AppConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let config = AppConfig {
            session_days: 100_000_000,
            ..AppConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SessionTtlTooLong(100_000_000))
        );
    }

    #[test]
    fn test_validate_digest_pin() {
        let good = AppConfig {
            model_sha256: Some("AB".repeat(32)),
            ..AppConfig::default()
        };
        assert!(good.validate().is_ok());
        assert_eq!(good.model_pin(), Some("AB".repeat(32).as_str()));

        let bad = AppConfig {
            model_sha256: Some("xyz".into()),
            ..AppConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::BadDigest(_))));
    }
}
