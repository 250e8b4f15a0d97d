//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. The mapping follows the storefront's error
//! taxonomy: validation errors block progression with 422, integrity
//! errors refuse the transition with 409, authorization failures get
//! 401/403, and persistence/gateway failures become 500/502 without
//! leaking internals.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use comelones_core::order::{CheckoutError, TransitionError};

use crate::db::RepositoryError;
use crate::services::nequi::GatewayError;
use crate::services::receipts::ReceiptError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Payment gateway operation failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Checkout input was rejected before persistence.
    #[error("Checkout rejected: {0}")]
    Checkout(#[from] CheckoutError),

    /// An order status transition was refused.
    #[error("Transition refused: {0}")]
    Transition(#[from] TransitionError),

    /// A concurrent write won the race.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Receipt storage failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No authenticated user in the session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Gateway(_)
                | Self::Session(_)
                | Self::Receipt(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) | Self::Receipt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Transition(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) | Self::Receipt(_) => {
                "Internal server error".to_string()
            }
            Self::Gateway(_) => "Payment gateway error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful login to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
