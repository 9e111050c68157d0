//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] clove_core::EmailError),

    /// Invalid phone number.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] clove_core::PhoneError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Email already belongs to a registered account.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No pending registration for this email (never started or expired).
    #[error("no pending registration for this email")]
    RegistrationNotFound,

    /// The submitted OTP does not match.
    #[error("invalid verification code")]
    InvalidOtp,

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account is blocked by an administrator.
    #[error("account is blocked")]
    AccountBlocked,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Sending the verification email failed.
    #[error("failed to send email: {0}")]
    EmailDelivery(#[from] crate::services::email::EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
