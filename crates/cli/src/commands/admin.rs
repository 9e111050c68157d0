//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! clove admin create -e admin@example.com -n "Admin Name" -r super_admin -p <password>
//! ```
//!
//! # Environment Variables
//!
//! - `CLOVE_DATABASE_URL` - `PostgreSQL` connection string

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use clove_core::{AdminRole, Email};

use super::CliError;

/// Create a new admin user with an argon2id password hash.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - Admin's role (`super_admin`, `admin`, or `viewer`)
/// * `password` - Login password, hashed before storage
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error for an invalid role or email, a duplicate email, or a
/// database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<i32, CliError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    let email: Email = email
        .parse()
        .map_err(|_| CliError::InvalidEmail(email.to_owned()))?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| CliError::PasswordHash)?
        .to_string();

    let pool = super::connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO admin_users (email, name, password_hash, role)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(email.as_str())
    .bind(name)
    .bind(&password_hash)
    .bind(role.to_string())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| CliError::UserExists(email.as_str().to_owned()))?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user_id,
        email,
        role
    );

    Ok(user_id)
}
