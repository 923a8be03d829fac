//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod accounts;
mod prediction;

pub use accounts::{AccountError, AccountService, LoginOutcome};
pub use prediction::{check_model, ContextError, Prediction, PredictionContext, PredictionService};
