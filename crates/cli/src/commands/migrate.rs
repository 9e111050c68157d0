//! Database migration command.
//!
//! Runs the schema migrations embedded from `crates/server/migrations/`,
//! then lets the tower-sessions store create its `session` table. The server
//! does not migrate on startup; this command is the one place the schema
//! moves.

use tower_sessions_sqlx_store::PostgresStore;

use super::CliError;

/// Run all database migrations.
///
/// # Errors
///
/// Returns an error if `CLOVE_DATABASE_URL` is not set, the connection
/// fails, or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = super::connect().await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Running session store migrations...");
    let store = PostgresStore::new(pool.clone());
    store.migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}
