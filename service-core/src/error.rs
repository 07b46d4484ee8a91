use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    InvalidRequest(anyhow::Error),

    #[error("invalid auth code")]
    InvalidCode,

    #[error("auth code expired")]
    ExpiredCode,

    #[error("user id not found")]
    UnknownUser,

    #[error("Token verification failed")]
    TokenVerificationFailed,

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::InvalidRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::InvalidCode => {
                (StatusCode::BAD_REQUEST, "invalid auth code".to_string(), None)
            }
            AppError::ExpiredCode => {
                (StatusCode::BAD_REQUEST, "auth code expired".to_string(), None)
            }
            AppError::UnknownUser => {
                (StatusCode::UNAUTHORIZED, "user id not found".to_string(), None)
            }
            // Collapsed to a single message on purpose: callers must not learn
            // which verification check failed.
            AppError::TokenVerificationFailed => (
                StatusCode::UNAUTHORIZED,
                "Token verification failed".to_string(),
                None,
            ),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
