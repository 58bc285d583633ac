//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Page handlers return `Result<T, AppError>`;
//! HTMX fragment handlers convert failures into inline notification markup
//! instead so a failed cart call never blanks the page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use larkspur_supabase::SupabaseError;

use crate::services::SessionError;
use crate::stores::CartError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Supabase call failed.
    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    /// Session oracle operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Operation requires a session that is absent.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Unauthenticated => Self::Unauthenticated,
            CartError::Remote(e) => Self::Supabase(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Supabase(_) | Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Supabase(SupabaseError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Supabase(SupabaseError::InvalidCredentials) | Self::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Self::Supabase(_) | Self::Session(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Supabase(SupabaseError::NotFound(_)) | Self::NotFound(_) => {
                "Not found".to_string()
            }
            Self::Supabase(SupabaseError::InvalidCredentials) => {
                "Invalid credentials".to_string()
            }
            Self::Unauthenticated => "Please sign in first".to_string(),
            Self::Supabase(_) | Self::Session(_) => "External service error".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 3".to_string());
        assert_eq!(err.to_string(), "Not found: product 3");

        let err = AppError::BadRequest("invalid rating".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid rating");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Supabase(SupabaseError::NotFound(
                "row".to_string()
            ))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_cart_error_conversion() {
        let err: AppError = CartError::Unauthenticated.into();
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
