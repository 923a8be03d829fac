//! Shared handler state.

use std::sync::Arc;

use crate::adapters::sqlite::SqliteStorage;
use crate::application::{AccountService, PredictionService};

/// Combined application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub prediction: Arc<PredictionService>,
    pub accounts: Arc<AccountService<SqliteStorage>>,
    /// Add `Secure` to every cookie
    pub secure_cookies: bool,
}

impl AppState {
    #[must_use]
    pub fn new(
        prediction: Arc<PredictionService>,
        accounts: Arc<AccountService<SqliteStorage>>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            prediction,
            accounts,
            secure_cookies,
        }
    }
}
