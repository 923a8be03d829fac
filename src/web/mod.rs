//! Web shell: axum router serving HTML pages and a JSON API.
//!
//! Endpoints:
//! - GET  /                             - symptom form (login required)
//! - POST /predict                      - prediction result page (login required)
//! - GET|POST /signup, /login           - account forms
//! - GET  /logout                       - end the session
//! - GET  /about, /contact, /developer, /blog
//! - POST /api/predict                  - prediction as JSON (login required)
//! - GET  /api/diseases/:name/symptoms  - typical symptoms (login required)
//! - GET  /api/health                   - liveness and model status

mod error;
mod handlers;
mod pages;
mod session;
mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::WebError;
pub use handlers::{ApiPredictResponse, DiseaseSymptomsResponse, HealthResponse};
pub use session::{Flash, FLASH_COOKIE, SESSION_COOKIE};
pub use state::AppState;

/// Build the axum router with all endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        .route("/signup", get(handlers::signup_page).post(handlers::signup))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
        .route("/developer", get(handlers::developer))
        .route("/blog", get(handlers::blog))
        .route("/api/predict", post(handlers::api_predict))
        .route("/api/diseases/:name/symptoms", get(handlers::api_disease_symptoms))
        .route("/api/health", get(handlers::api_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
