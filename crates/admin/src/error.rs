//! Unified error handling for the dashboard API.
//!
//! Every error leaves the service as `{"error": "<message>"}`; validation
//! failures add an `errors` list (and, for imports, the rows that parsed).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::{RepositoryError, SettingsError};
use crate::services::{AuthError, ExportError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Delivery or user store failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Settings store failed.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Export encoding failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Login or account management failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Content failed validation; every problem is listed.
    #[error("Validation failed: {} error(s)", errors.len())]
    Validation {
        errors: Vec<String>,
        data: Option<Value>,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Repository(e) | Self::Settings(SettingsError::Storage(e)) => repository_status(e),
            Self::Auth(AuthError::InvalidCredentials) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) | AuthError::InvalidRole(_),
            )
            | Self::Export(ExportError::Unmappable(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::Repository(e)) => repository_status(e),
            Self::Auth(AuthError::PasswordHash)
            | Self::Export(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::SERVICE_UNAVAILABLE => "Storage unavailable".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::UNAUTHORIZED if matches!(self, Self::Auth(_)) => {
                "Invalid email or password".to_string()
            }
            _ => match self {
                Self::Repository(RepositoryError::NotFound) => "Not found".to_string(),
                Self::Export(e) => e.to_string(),
                Self::Auth(e) => e.to_string(),
                _ => self.to_string(),
            },
        }
    }
}

const fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
        RepositoryError::DataCorruption { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = self.public_message();
        let body = match self {
            Self::Validation { errors, data } => {
                let mut body = json!({ "error": message, "errors": errors });
                if let Some(data) = data {
                    body["data"] = data;
                }
                body
            }
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context from the session user.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
