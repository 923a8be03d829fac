//! # SymptomCheck
//!
//! Symptom-based disease lookup behind a small account-gated web app.
//!
//! This crate provides:
//! - Symptom vectorization against a fixed 132-slot catalog
//! - Disease prediction through a pre-trained linear classifier
//! - Reference lookups (description, precautions, medications, diets, workouts)
//! - User accounts with Argon2id passwords and server-side sessions
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (catalogs, vectors, reference rows, users)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (CSV tables, linear SVC, SQLite)
//! - `application`: Use cases orchestrating domain and ports
//! - `web`: HTTP shell (axum)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod web;

pub use application::{AccountService, PredictionContext, PredictionService};
pub use config::AppConfig;
pub use domain::{PredictionError, PredictionResult};

/// Result type for SymptomCheck operations
pub type Result<T> = std::result::Result<T, SymptomCheckError>;

/// Main error type for SymptomCheck
#[derive(Debug, thiserror::Error)]
pub enum SymptomCheckError {
    #[error("Prediction failed: {0}")]
    Prediction(#[from] domain::PredictionError),

    #[error("Startup consistency check failed: {0}")]
    Context(#[from] application::ContextError),

    #[error("Reference data error: {0}")]
    ReferenceData(#[from] adapters::csv_tables::ReferenceDataError),

    #[error("Model error: {0}")]
    Model(#[from] adapters::linear_svc::ModelLoadError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Account error: {0}")]
    Account(#[from] application::AccountError),

    #[error("Password error: {0}")]
    Password(#[from] domain::password::PasswordError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
