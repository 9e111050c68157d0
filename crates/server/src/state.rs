//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::email::EmailService;
use crate::services::media::MediaService;
use crate::services::otp::PendingRegistrationStore;
use crate::services::payments::StripeGateway;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; gives handlers access to the database pool,
/// configuration, and the external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    media: MediaService,
    payments: StripeGateway,
    email: EmailService,
    pending_registrations: PendingRegistrationStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay configuration is invalid.
    pub fn new(
        config: ServerConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let media = MediaService::new(&config.media);
        let payments = StripeGateway::new(&config.stripe);
        let email = EmailService::new(&config.email)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
                payments,
                email,
                pending_registrations: PendingRegistrationStore::new(),
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the image host client.
    #[must_use]
    pub fn media(&self) -> &MediaService {
        &self.inner.media
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payments(&self) -> &StripeGateway {
        &self.inner.payments
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the pending-registration store.
    #[must_use]
    pub fn pending_registrations(&self) -> &PendingRegistrationStore {
        &self.inner.pending_registrations
    }
}
