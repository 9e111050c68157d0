//! CLI subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password could not be hashed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// User already exists.
    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    /// Seed fixture contains a malformed value.
    #[error("Invalid seed data: {0}")]
    SeedData(String),
}

/// Connect to the database named by `CLOVE_DATABASE_URL`.
pub(crate) async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CLOVE_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("CLOVE_DATABASE_URL"))?;

    Ok(PgPool::connect(database_url.expose_secret()).await?)
}
