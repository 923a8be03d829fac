//! Error types and HTTP error responses for the web shell.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::AccountError;
use crate::domain::PredictionError;

/// Request-level error type.
#[derive(Debug)]
pub enum WebError {
    /// The prediction pipeline refused the request.
    Prediction(PredictionError),
    /// No valid session.
    Unauthorized,
    /// A named resource does not exist.
    NotFound(String),
    /// A request body could not be deserialized.
    BadRequest(String),
    /// Storage, hashing or task failure.
    Internal(String),
}

/// JSON body returned on error.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

fn status_for_prediction(e: &PredictionError) -> StatusCode {
    match e {
        PredictionError::EmptyInput | PredictionError::NoValidSymptoms => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PredictionError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        PredictionError::UnknownDiseaseLabel(_) | PredictionError::Classifier(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match &self {
            WebError::Prediction(e) => {
                if matches!(
                    e,
                    PredictionError::UnknownDiseaseLabel(_) | PredictionError::Classifier(_)
                ) {
                    tracing::error!("Prediction failed: {}", e);
                }
                (status_for_prediction(e), e.user_message().to_string(), Some(e.kind()))
            }
            WebError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Please log in to access this page.".to_string(),
                None,
            ),
            WebError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            WebError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code: status.as_u16(),
            kind,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<PredictionError> for WebError {
    fn from(e: PredictionError) -> Self {
        WebError::Prediction(e)
    }
}

impl From<AccountError> for WebError {
    fn from(e: AccountError) -> Self {
        WebError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_status_mapping() {
        let status = |e| WebError::Prediction(e).into_response().status();
        assert_eq!(status(PredictionError::EmptyInput), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(PredictionError::NoValidSymptoms), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(PredictionError::ModelUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status(PredictionError::UnknownDiseaseLabel(99)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized() {
        assert_eq!(
            WebError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
