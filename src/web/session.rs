//! Cookies, flash messages and the per-request visitor.
//!
//! Two cookies are used:
//! - `session`: opaque login token; the server stores only its hash
//! - `flash`: dot-separated message codes shown once on the next page

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};

use crate::domain::{SessionToken, User};

use super::error::WebError;
use super::state::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

/// Flash cookies only need to survive one redirect.
const FLASH_MAX_AGE_SECS: i64 = 300;

/// One-shot messages carried across a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    LoginRequired,
    SignupSuccess,
    EmailTaken,
    LoggedIn,
    LoggedOut,
}

impl Flash {
    const ALL: [Flash; 5] = [
        Flash::LoginRequired,
        Flash::SignupSuccess,
        Flash::EmailTaken,
        Flash::LoggedIn,
        Flash::LoggedOut,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Flash::LoginRequired => "login_required",
            Flash::SignupSuccess => "signup_success",
            Flash::EmailTaken => "email_taken",
            Flash::LoggedIn => "logged_in",
            Flash::LoggedOut => "logged_out",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Bootstrap-style alert category.
    #[must_use]
    pub fn category(self) -> &'static str {
        match self {
            Flash::LoginRequired | Flash::LoggedOut => "info",
            Flash::SignupSuccess | Flash::LoggedIn => "success",
            Flash::EmailTaken => "danger",
        }
    }

    /// Text shown to the visitor.
    #[must_use]
    pub fn message(self, user: Option<&User>) -> String {
        match self {
            Flash::LoginRequired => "Please log in to access this page.".to_string(),
            Flash::SignupSuccess => "Registration successful! You can now log in.".to_string(),
            Flash::EmailTaken => {
                "This email is already registered. Please log in or use another email.".to_string()
            }
            Flash::LoggedIn => match user {
                Some(user) => format!("You are now logged in. Welcome, {}!", user.username),
                None => "You are now logged in.".to_string(),
            },
            Flash::LoggedOut => "You have been logged out.".to_string(),
        }
    }
}

/// Value of a cookie from the request headers.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

fn cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[must_use]
pub fn session_cookie(token: &SessionToken, ttl: chrono::Duration, secure: bool) -> String {
    cookie(SESSION_COOKIE, token.as_str(), ttl.num_seconds().max(0), secure)
}

#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    cookie(SESSION_COOKIE, "", 0, secure)
}

#[must_use]
pub fn flash_cookie(flashes: &[Flash], secure: bool) -> String {
    let codes: Vec<&str> = flashes.iter().map(|f| f.code()).collect();
    cookie(FLASH_COOKIE, &codes.join("."), FLASH_MAX_AGE_SECS, secure)
}

#[must_use]
pub fn clear_flash_cookie(secure: bool) -> String {
    cookie(FLASH_COOKIE, "", 0, secure)
}

fn parse_flashes(value: &str) -> Vec<Flash> {
    value.split('.').filter_map(Flash::from_code).collect()
}

/// Accept only same-site absolute paths as a post-login target.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control);
    local.then(|| next.to_string())
}

/// Who is making the request, plus any pending flash messages.
#[derive(Debug, Default)]
pub struct Visitor {
    pub user: Option<User>,
    pub token: Option<SessionToken>,
    pub flashes: Vec<Flash>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Visitor {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let flashes = cookie_value(&parts.headers, FLASH_COOKIE)
            .map(|v| parse_flashes(&v))
            .unwrap_or_default();

        let Some(token) = cookie_value(&parts.headers, SESSION_COOKIE)
            .as_deref()
            .and_then(SessionToken::from_cookie)
        else {
            return Ok(Self {
                flashes,
                ..Self::default()
            });
        };

        let accounts = state.accounts.clone();
        let lookup = token.clone();
        let user = tokio::task::spawn_blocking(move || accounts.current_user(&lookup))
            .await
            .map_err(|e| WebError::Internal(e.to_string()))??;

        Ok(Self {
            user,
            token: Some(token),
            flashes,
        })
    }
}

impl Visitor {
    /// Redirect to the login page, remembering where the visitor wanted to go.
    #[must_use]
    pub fn login_redirect(&self, next: &str, secure: bool) -> Response {
        let mut flashes = self.flashes.clone();
        flashes.push(Flash::LoginRequired);

        let target = format!("/login?next={}", urlencoding::encode(next));
        redirect_with(&target, &flashes, &[], secure)
    }
}

/// See-other redirect that sets flash messages and any extra cookies.
#[must_use]
pub fn redirect_with(to: &str, flashes: &[Flash], cookies: &[String], secure: bool) -> Response {
    let mut set_cookies: Vec<(axum::http::HeaderName, HeaderValue)> = Vec::new();
    for value in cookies {
        if let Ok(v) = HeaderValue::from_str(value) {
            set_cookies.push((SET_COOKIE, v));
        }
    }
    if !flashes.is_empty() {
        if let Ok(v) = HeaderValue::from_str(&flash_cookie(flashes, secure)) {
            set_cookies.push((SET_COOKIE, v));
        }
    }

    (AppendHeaders(set_cookies), Redirect::to(to)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; session=abc_DEF; flash=logged_in"));
        assert_eq!(cookie_value(&headers, "session").as_deref(), Some("abc_DEF"));
        assert_eq!(cookie_value(&headers, "flash").as_deref(), Some("logged_in"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_flash_codes_roundtrip_through_cookie_value() {
        for flash in Flash::ALL {
            assert_eq!(Flash::from_code(flash.code()), Some(flash));
        }
        assert_eq!(
            parse_flashes("logged_out.login_required.bogus"),
            vec![Flash::LoggedOut, Flash::LoginRequired]
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let token = SessionToken::from_cookie("tok").expect("Should accept token");
        let plain = session_cookie(&token, chrono::Duration::days(1), false);
        assert_eq!(
            plain,
            "session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );
        assert!(session_cookie(&token, chrono::Duration::days(1), true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/predict")), Some("/predict".to_string()));
        assert_eq!(safe_next(Some("/api/health?x=1")), Some("/api/health?x=1".to_string()));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn test_login_redirect_encodes_next() {
        let visitor = Visitor::default();
        let resp = visitor.login_redirect("/api/diseases/Common Cold", false);
        let location = resp
            .headers()
            .get(axum::http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("Should redirect");
        assert_eq!(location, "/login?next=%2Fapi%2Fdiseases%2FCommon%20Cold");
    }
}
