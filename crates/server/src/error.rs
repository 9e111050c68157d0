//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. The `IntoResponse`
//! impl maps each error class onto a status code and a JSON
//! `{ "message": ... }` body; server-side classes are captured to Sentry and
//! answer with a generic message so internals never leak to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::media::MediaError;
use crate::services::payments::PaymentError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout/order lifecycle operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Image host operation failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    fn is_server_side(&self) -> bool {
        match self {
            Self::Internal(_) | Self::Media(_) => true,
            Self::Database(e) => matches!(
                e,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Payment(e) => !matches!(e, PaymentError::UnknownTransaction(_)),
            Self::Auth(AuthError::Repository(e)) => matches!(
                e,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Auth(e) => matches!(e, AuthError::PasswordHash | AuthError::EmailDelivery(_)),
            Self::Checkout(CheckoutError::Payment(e)) => {
                !matches!(e, PaymentError::UnknownTransaction(_))
            }
            Self::Checkout(CheckoutError::Repository(e)) => matches!(
                e,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Checkout(_) => false,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(e) => repository_status(e),
            Self::Auth(e) => match e {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountBlocked => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::RegistrationNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidOtp => StatusCode::BAD_REQUEST,
                AuthError::EmailDelivery(_) => StatusCode::BAD_GATEWAY,
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Repository(e) => repository_status(e),
            },
            Self::Checkout(e) => match e {
                CheckoutError::EmptyCart
                | CheckoutError::UnlistedProduct(_)
                | CheckoutError::MissingTransactionId
                | CheckoutError::GatewayNotEnabled(_)
                | CheckoutError::InvalidDiscount(_)
                | CheckoutError::AmountOverflow
                | CheckoutError::NothingToVerify => StatusCode::BAD_REQUEST,
                CheckoutError::IllegalTransition { .. }
                | CheckoutError::ReturnBeforeDelivery { .. } => StatusCode::CONFLICT,
                CheckoutError::Payment(e) => payment_status(e),
                CheckoutError::Repository(e) => repository_status(e),
            },
            Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::Payment(e) => payment_status(e),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        if self.is_server_side() {
            return match self {
                Self::Media(_) => "Image upload failed".to_owned(),
                Self::Payment(_) | Self::Checkout(CheckoutError::Payment(_)) => {
                    "Payment gateway error".to_owned()
                }
                Self::Auth(AuthError::EmailDelivery(_)) => {
                    "Failed to send verification email".to_owned()
                }
                _ => "Internal server error".to_owned(),
            };
        }

        match self {
            Self::Database(e) | Self::Auth(AuthError::Repository(e)) => match e {
                RepositoryError::NotFound => "Not found".to_owned(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_owned(),
            },
            Self::Auth(e) => e.to_string(),
            Self::Checkout(CheckoutError::Repository(RepositoryError::NotFound)) => {
                "Not found".to_owned()
            }
            Self::Checkout(e) => e.to_string(),
            Self::Payment(e) => e.to_string(),
            Self::NotFound(msg) => format!("Not found: {msg}"),
            Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.clone(),
            Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            _ => "Internal server error".to_owned(),
        }
    }
}

const fn repository_status(e: &RepositoryError) -> StatusCode {
    match e {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

const fn payment_status(e: &PaymentError) -> StatusCode {
    match e {
        PaymentError::UnknownTransaction(_) => StatusCode::BAD_REQUEST,
        PaymentError::Http(_) | PaymentError::Gateway { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_side() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            message: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_owned());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_basic_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("x".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("x".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_http() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "name taken".to_owned()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_illegal_transition_is_conflict() {
        let err = AppError::Checkout(CheckoutError::IllegalTransition {
            what: "order_status",
            from: "delivered".to_owned(),
            to: "cancelled".to_owned(),
        });
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_errors_map_to_http() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidOtp)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::AccountBlocked)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AppError::Internal("connection pool exhausted".to_owned());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
