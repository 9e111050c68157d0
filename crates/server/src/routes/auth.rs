//! Authentication handlers: OTP registration, login, logout.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use clove_core::AdminRole;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{CurrentAdmin, CurrentUser, User, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Request to start a registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub password: String,
}

/// Request to complete a registration.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Login request, shared by customers and admins.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// A customer, as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: clove_core::UserId,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into_inner(),
            name: user.name,
            phone: user.phone.into_inner(),
            created_at: user.created_at,
        }
    }
}

/// An admin, as returned by the API.
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: clove_core::AdminUserId,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
}

fn session_error(e: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

/// `POST /auth/register` - start an OTP registration.
///
/// # Errors
///
/// Returns 409 if the email is already registered, 400 for invalid input,
/// or 502 if the OTP mail cannot be sent.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let auth = AuthService::new(
        state.pool(),
        state.pending_registrations(),
        state.email(),
    );
    auth.begin_registration(&body.email, &body.name, &body.phone, &body.password)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "verification code sent".to_owned(),
        }),
    ))
}

/// `POST /auth/register/verify` - complete a registration with the OTP.
///
/// On success the new user is logged in.
///
/// # Errors
///
/// Returns 404 if no pending registration exists (or it expired), 400 for a
/// wrong code.
pub async fn verify_registration(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<UserResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.pending_registrations(),
        state.email(),
    );
    let user = auth.verify_registration(&body.email, &body.otp).await?;

    establish_user_session(&session, &user).await?;
    Ok(Json(user.into()))
}

/// `POST /auth/login` - customer login.
///
/// # Errors
///
/// Returns 401 for bad credentials, 403 for a blocked account.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.pending_registrations(),
        state.email(),
    );
    let user = auth.login(&body.email, &body.password).await?;

    establish_user_session(&session, &user).await?;
    Ok(Json(user.into()))
}

/// `POST /auth/admin/login` - console operator login.
///
/// # Errors
///
/// Returns 401 for bad credentials.
pub async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AdminResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.pending_registrations(),
        state.email(),
    );
    let admin = auth.admin_login(&body.email, &body.password).await?;

    // Fresh session id on privilege change
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(
            session_keys::CURRENT_ADMIN,
            CurrentAdmin {
                id: admin.id,
                email: admin.email.as_str().to_owned(),
                name: admin.name.clone(),
                role: admin.role,
            },
        )
        .await
        .map_err(session_error)?;

    Ok(Json(AdminResponse {
        id: admin.id,
        email: admin.email.into_inner(),
        name: admin.name,
        role: admin.role,
    }))
}

/// `POST /auth/logout` - drop the session.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    session.flush().await.map_err(session_error)?;
    Ok(Json(MessageResponse {
        message: "logged out".to_owned(),
    }))
}

/// `GET /auth/me` - the logged-in customer's profile.
///
/// # Errors
///
/// Returns 401 when not logged in, 404 if the account no longer exists.
pub async fn me(
    State(state): State<AppState>,
    crate::middleware::auth::RequireUser(current): crate::middleware::auth::RequireUser,
) -> Result<Json<UserResponse>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account no longer exists".to_owned()))?;

    Ok(Json(user.into()))
}

async fn establish_user_session(session: &Session, user: &User) -> Result<()> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(
            session_keys::CURRENT_USER,
            CurrentUser {
                id: user.id,
                email: user.email.as_str().to_owned(),
                name: user.name.clone(),
            },
        )
        .await
        .map_err(session_error)?;
    Ok(())
}
