//! Error hierarchy shared by every handler.
//!
//! Handlers return `Result<_, ApiError>`; the status code and the
//! `{"success": false, "error": ...}` envelope are decided here only.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Credential check failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("no account for this email")]
    NotFound,
    #[error("password does not match")]
    InvalidCredentials,
    #[error("account is not active")]
    AccountInactive,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}: {source:#}")]
    Internal {
        message: &'static str,
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wrap an unexpected failure; only `message` reaches the client.
    pub fn internal(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message,
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::NotFound | AuthError::InvalidCredentials)
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::AccountInactive) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message rendered in the response body.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            // Unknown email and wrong password look the same to the caller.
            Self::Auth(AuthError::NotFound | AuthError::InvalidCredentials) => {
                "Invalid credentials".to_string()
            }
            Self::Auth(AuthError::AccountInactive) => "Account is not active".to_string(),
            Self::Validation(message)
            | Self::Forbidden(message)
            | Self::Unauthorized(message)
            | Self::NotFound(message) => message.clone(),
            Self::Internal { message, .. } => (*message).to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { message, source } = &self {
            error!(error = %format!("{source:#}"), "{message}");
        }
        let body = json!({
            "success": false,
            "error": self.public_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}
