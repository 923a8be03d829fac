//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `csv_tables`: csv + serde for the reference tables
//! - `linear_svc`: JSON-exported linear SVC classifier
//! - `sqlite`: SQLite for users and sessions
//! - `sanitize`: PII filtering for logs

pub mod csv_tables;
pub mod linear_svc;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
