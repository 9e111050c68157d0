//! Pending-registration store.
//!
//! Registration is a two-step flow: the caller posts their details, receives
//! a one-time password by email, and only becomes a user after echoing it
//! back. Until then the registration lives here - a keyed, TTL-bounded cache
//! entry per email address. Entries expire on their own after
//! [`PENDING_TTL`] and are invalidated explicitly on successful
//! verification, so a code can be used at most once.

use std::time::Duration;

use moka::future::Cache;
use rand::Rng;

use clove_core::{Email, Phone};

/// How long a pending registration (and its OTP) stays valid.
pub const PENDING_TTL: Duration = Duration::from_secs(5 * 60);

/// Number of digits in a generated OTP.
const OTP_DIGITS: u32 = 6;

/// A registration waiting for its OTP to be verified.
///
/// The password is hashed before it enters the store; the plaintext never
/// outlives the register request.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub email: Email,
    pub name: String,
    pub phone: Phone,
    pub password_hash: String,
    pub otp: String,
}

/// Keyed, TTL-bounded store for registrations awaiting OTP verification.
#[derive(Clone)]
pub struct PendingRegistrationStore {
    cache: Cache<String, PendingRegistration>,
}

impl PendingRegistrationStore {
    /// Create a store with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(PENDING_TTL)
    }

    /// Create a store with a custom TTL (used by tests).
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Store a pending registration, replacing any earlier attempt for the
    /// same email (the newest OTP wins and the TTL restarts).
    pub async fn put(&self, pending: PendingRegistration) {
        self.cache
            .insert(pending.email.as_str().to_owned(), pending)
            .await;
    }

    /// Look up the pending registration for an email, if it has not expired.
    pub async fn get(&self, email: &Email) -> Option<PendingRegistration> {
        self.cache.get(email.as_str()).await
    }

    /// Whether a non-expired pending registration exists for this email.
    pub async fn contains(&self, email: &Email) -> bool {
        self.cache.contains_key(email.as_str())
    }

    /// Remove the entry after successful verification.
    pub async fn remove(&self, email: &Email) {
        self.cache.invalidate(email.as_str()).await;
    }
}

impl Default for PendingRegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a zero-padded numeric OTP.
#[must_use]
pub fn generate_otp() -> String {
    let upper = 10_u32.pow(OTP_DIGITS);
    let code = rand::rng().random_range(0..upper);
    format!("{code:0width$}", width = OTP_DIGITS as usize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pending(email: &str, otp: &str) -> PendingRegistration {
        PendingRegistration {
            email: Email::parse(email).unwrap(),
            name: "Test User".to_owned(),
            phone: Phone::parse("9876543210").unwrap(),
            password_hash: "$argon2id$stub".to_owned(),
            otp: otp.to_owned(),
        }
    }

    #[test]
    fn test_generate_otp_shape() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = PendingRegistrationStore::new();
        let email = Email::parse("user@example.com").unwrap();

        assert!(store.get(&email).await.is_none());

        store.put(pending("user@example.com", "123456")).await;
        let found = store.get(&email).await.unwrap();
        assert_eq!(found.otp, "123456");

        store.remove(&email).await;
        assert!(store.get(&email).await.is_none());
    }

    #[tokio::test]
    async fn test_reregistration_replaces_entry() {
        let store = PendingRegistrationStore::new();
        let email = Email::parse("user@example.com").unwrap();

        store.put(pending("user@example.com", "111111")).await;
        store.put(pending("user@example.com", "222222")).await;

        let found = store.get(&email).await.unwrap();
        assert_eq!(found.otp, "222222");
    }

    #[tokio::test]
    async fn test_entries_are_keyed_per_email() {
        let store = PendingRegistrationStore::new();

        store.put(pending("a@example.com", "111111")).await;
        store.put(pending("b@example.com", "222222")).await;

        let a = Email::parse("a@example.com").unwrap();
        let b = Email::parse("b@example.com").unwrap();
        assert_eq!(store.get(&a).await.unwrap().otp, "111111");
        assert_eq!(store.get(&b).await.unwrap().otp, "222222");
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let store = PendingRegistrationStore::with_ttl(Duration::from_millis(50));
        let email = Email::parse("user@example.com").unwrap();

        store.put(pending("user@example.com", "123456")).await;
        assert!(store.contains(&email).await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.get(&email).await.is_none());
    }
}
