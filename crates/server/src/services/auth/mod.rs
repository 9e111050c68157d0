//! Authentication service.
//!
//! Customer registration is OTP-gated: `begin_registration` parks the
//! details in the TTL-bounded pending store and emails a code;
//! `verify_registration` turns a pending entry into a real user. Login is
//! argon2 password verification for customers and console operators alike.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use clove_core::{Email, Phone};

use crate::db::{AdminUserRepository, UserRepository};
use crate::models::{AdminUser, User};
use crate::services::email::EmailService;
use crate::services::otp::{self, PendingRegistration, PendingRegistrationStore};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    admins: AdminUserRepository<'a>,
    pending: &'a PendingRegistrationStore,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        pending: &'a PendingRegistrationStore,
        email: &'a EmailService,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            admins: AdminUserRepository::new(pool),
            pending,
            email,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Start a registration: validate the details, park them in the pending
    /// store, and email an OTP.
    ///
    /// Re-posting for the same email replaces the earlier attempt with a
    /// fresh code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is already
    /// registered, validation errors for bad input, or
    /// `AuthError::EmailDelivery` if the OTP mail cannot be sent.
    pub async fn begin_registration(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let phone = Phone::parse(phone)?;
        validate_password(password)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        // Hash before parking: the plaintext must not outlive this request
        let password_hash = hash_password(password)?;
        let code = otp::generate_otp();

        self.pending
            .put(PendingRegistration {
                email: email.clone(),
                name: name.trim().to_owned(),
                phone,
                password_hash,
                otp: code.clone(),
            })
            .await;

        let ttl_minutes = otp::PENDING_TTL.as_secs() / 60;
        self.email
            .send_otp_code(email.as_str(), name.trim(), &code, ttl_minutes)
            .await?;

        tracing::info!(email = %email, "registration started, OTP sent");
        Ok(())
    }

    /// Complete a registration by verifying the OTP.
    ///
    /// On success the pending entry is consumed and the user row created.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationNotFound` if no pending entry exists
    /// (or it expired), `AuthError::InvalidOtp` on a wrong code, or
    /// `AuthError::UserAlreadyExists` if the email got registered in between.
    pub async fn verify_registration(&self, email: &str, code: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let pending = self
            .pending
            .get(&email)
            .await
            .ok_or(AuthError::RegistrationNotFound)?;

        if pending.otp != code {
            return Err(AuthError::InvalidOtp);
        }

        let user = self
            .users
            .create(
                &pending.email,
                &pending.name,
                &pending.phone,
                &pending.password_hash,
            )
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        self.pending.remove(&email).await;

        // Welcome mail is best-effort; the account exists either way
        if let Err(e) = self.email.send_welcome(user.email.as_str(), &user.name).await {
            tracing::warn!(error = %e, "failed to send welcome email");
        }

        tracing::info!(user_id = %user.id, "registration verified");
        Ok(user)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Log a customer in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, and `AuthError::AccountBlocked` for blocked accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if user.is_blocked {
            return Err(AuthError::AccountBlocked);
        }

        Ok(user)
    }

    /// Log a console operator in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email)?;

        let (admin, password_hash) = self
            .admins
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(admin)
    }
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2id and a fresh salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough password").is_ok());
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::PasswordHash)
        ));
    }
}
