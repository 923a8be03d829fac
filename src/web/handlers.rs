//! Route handlers.
//!
//! Account operations hash passwords and hit SQLite, so they run on the
//! blocking pool. Predictions only read in-memory data and run inline.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::application::AccountError;
use crate::domain::password::PasswordError;
use crate::domain::{LoginForm, PredictionError, PredictionResult, SignupForm};

use super::error::WebError;
use super::pages::{self, IndexView, PageContext, StaticPage};
use super::session::{
    clear_flash_cookie, clear_session_cookie, redirect_with, safe_next, session_cookie, Flash,
    Visitor,
};
use super::state::AppState;

// ── Request / Response types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    #[serde(default)]
    pub symptoms: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPredictRequest {
    #[serde(default)]
    pub symptoms: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiPredictResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub matched_symptoms: Vec<String>,
    pub ignored_symptoms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiseaseSymptomsResponse {
    pub disease: String,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub symptoms: usize,
    pub diseases: usize,
}

// ── Helpers ─────────────────────────────────────────────────────────

fn page_context(visitor: &Visitor) -> PageContext<'_> {
    PageContext {
        user: visitor.user.as_ref(),
        flashes: &visitor.flashes,
    }
}

/// HTML response that consumes pending flashes and drops a dead session cookie.
fn render(state: &AppState, visitor: &Visitor, status: StatusCode, html: String) -> Response {
    let mut response = (status, Html(html)).into_response();

    let mut clear = Vec::new();
    if !visitor.flashes.is_empty() {
        clear.push(clear_flash_cookie(state.secure_cookies));
    }
    if visitor.token.is_some() && visitor.user.is_none() {
        clear.push(clear_session_cookie(state.secure_cookies));
    }
    for cookie in clear {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

async fn blocking<T, F>(f: F) -> Result<T, WebError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WebError::Internal(format!("Blocking task failed: {e}")))
}

// ── Prediction pages ────────────────────────────────────────────────

pub async fn index(State(state): State<AppState>, visitor: Visitor) -> Response {
    if visitor.user.is_none() {
        return visitor.login_redirect("/", state.secure_cookies);
    }
    let html = pages::index(&page_context(&visitor), "", IndexView::Empty);
    render(&state, &visitor, StatusCode::OK, html)
}

pub async fn predict(
    State(state): State<AppState>,
    visitor: Visitor,
    body: Result<Form<PredictForm>, FormRejection>,
) -> Response {
    if visitor.user.is_none() {
        return visitor.login_redirect("/", state.secure_cookies);
    }
    let form = match body {
        Ok(Form(form)) => form,
        Err(e) => return WebError::BadRequest(e.body_text()).into_response(),
    };

    let ctx = page_context(&visitor);
    let html = match state.prediction.predict_detailed(&form.symptoms) {
        Ok(prediction) => pages::index(&ctx, &form.symptoms, IndexView::Result(&prediction)),
        Err(e) => {
            if matches!(
                e,
                PredictionError::UnknownDiseaseLabel(_) | PredictionError::Classifier(_)
            ) {
                tracing::error!("Prediction failed: {}", e);
            }
            pages::index(&ctx, &form.symptoms, IndexView::Message(e.user_message()))
        }
    };
    render(&state, &visitor, StatusCode::OK, html)
}

// ── Accounts ────────────────────────────────────────────────────────

pub async fn signup_page(State(state): State<AppState>, visitor: Visitor) -> Response {
    if visitor.user.is_some() {
        return Redirect::to("/").into_response();
    }
    let html = pages::signup(&page_context(&visitor), &[], "", "");
    render(&state, &visitor, StatusCode::OK, html)
}

pub async fn signup(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    if visitor.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = form.username.clone();
    let email = form.email.clone();
    let accounts = state.accounts.clone();
    let secure = state.secure_cookies;

    let errors = match blocking(move || accounts.signup(&form)).await? {
        Ok(_) => {
            return Ok(redirect_with("/login", &[Flash::SignupSuccess], &[], secure));
        }
        Err(AccountError::EmailTaken) => {
            return Ok(redirect_with("/signup", &[Flash::EmailTaken], &[], secure));
        }
        Err(AccountError::Invalid(errors)) => errors,
        Err(e @ (AccountError::UsernameTaken | AccountError::Password(PasswordError::TooShort))) => {
            vec![e.to_string()]
        }
        Err(e) => return Err(e.into()),
    };

    let html = pages::signup(&page_context(&visitor), &errors, &username, &email);
    Ok(render(&state, &visitor, StatusCode::UNPROCESSABLE_ENTITY, html))
}

pub async fn login_page(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<NextQuery>,
) -> Response {
    if visitor.user.is_some() {
        return Redirect::to("/").into_response();
    }
    let next = safe_next(query.next.as_deref());
    let html = pages::login(&page_context(&visitor), &[], "", next.as_deref());
    render(&state, &visitor, StatusCode::OK, html)
}

pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if visitor.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let next = safe_next(query.next.as_deref());
    let email = form.email.clone();
    let accounts = state.accounts.clone();
    let secure = state.secure_cookies;
    let ttl = state.accounts.session_ttl();

    match blocking(move || accounts.login(&form)).await? {
        Ok(outcome) => {
            let target = next.unwrap_or_else(|| "/".to_string());
            let cookie = session_cookie(&outcome.token, ttl, secure);
            Ok(redirect_with(&target, &[Flash::LoggedIn], &[cookie], secure))
        }
        Err(AccountError::InvalidCredentials) => {
            let errors = vec!["Login failed. Please check your email and password.".to_string()];
            let html = pages::login(&page_context(&visitor), &errors, &email, next.as_deref());
            Ok(render(&state, &visitor, StatusCode::UNAUTHORIZED, html))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(State(state): State<AppState>, visitor: Visitor) -> Result<Response, WebError> {
    let (Some(_), Some(token)) = (&visitor.user, visitor.token.clone()) else {
        return Ok(visitor.login_redirect("/logout", state.secure_cookies));
    };

    let accounts = state.accounts.clone();
    blocking(move || accounts.logout(&token)).await??;

    let secure = state.secure_cookies;
    Ok(redirect_with(
        "/",
        &[Flash::LoggedOut],
        &[clear_session_cookie(secure)],
        secure,
    ))
}

// ── Static pages ────────────────────────────────────────────────────

fn static_page(state: &AppState, visitor: &Visitor, page: StaticPage) -> Response {
    let html = pages::static_page(&page_context(visitor), page);
    render(state, visitor, StatusCode::OK, html)
}

pub async fn about(State(state): State<AppState>, visitor: Visitor) -> Response {
    static_page(&state, &visitor, StaticPage::About)
}

pub async fn contact(State(state): State<AppState>, visitor: Visitor) -> Response {
    static_page(&state, &visitor, StaticPage::Contact)
}

pub async fn developer(State(state): State<AppState>, visitor: Visitor) -> Response {
    static_page(&state, &visitor, StaticPage::Developer)
}

pub async fn blog(State(state): State<AppState>, visitor: Visitor) -> Response {
    static_page(&state, &visitor, StaticPage::Blog)
}

// ── JSON API ────────────────────────────────────────────────────────

pub async fn api_predict(
    State(state): State<AppState>,
    visitor: Visitor,
    body: Result<Json<ApiPredictRequest>, JsonRejection>,
) -> Result<Json<ApiPredictResponse>, WebError> {
    if visitor.user.is_none() {
        return Err(WebError::Unauthorized);
    }
    let Json(request) = body.map_err(|e| WebError::BadRequest(e.body_text()))?;

    let prediction = state.prediction.predict_detailed(&request.symptoms)?;
    Ok(Json(ApiPredictResponse {
        result: prediction.result,
        matched_symptoms: prediction.matched,
        ignored_symptoms: prediction.ignored,
    }))
}

pub async fn api_disease_symptoms(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(name): Path<String>,
) -> Result<Json<DiseaseSymptomsResponse>, WebError> {
    if visitor.user.is_none() {
        return Err(WebError::Unauthorized);
    }

    let symptoms = state
        .prediction
        .typical_symptoms(&name)
        .ok_or_else(|| WebError::NotFound(format!("Disease {name:?}")))?;
    Ok(Json(DiseaseSymptomsResponse {
        disease: name,
        symptoms,
    }))
}

pub async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let context = state.prediction.context();
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.prediction.model_loaded(),
        symptoms: context.symptoms().len(),
        diseases: context.diseases().len(),
    })
}
