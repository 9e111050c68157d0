//! Payment gateway integration.
//!
//! Checkout never trusts a client's claim that it paid: the gateway is asked
//! to confirm the transaction before the order's payment status moves to
//! `completed`. The trait is the seam; [`StripeGateway`] is the only live
//! implementation.

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

/// Errors from talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport-level failure reaching the gateway.
    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway does not know this transaction.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),

    /// The gateway answered with an error.
    #[error("payment gateway error ({status}): {message}")]
    Gateway {
        /// HTTP status from the gateway.
        status: u16,
        /// Gateway-provided error message.
        message: String,
    },
}

/// Outcome of asking the gateway about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The charge settled.
    Succeeded,
    /// The charge did not settle; `reason` is the gateway's wording.
    Failed {
        /// Why the charge did not settle.
        reason: String,
    },
}

/// A payment provider that can confirm whether a transaction settled.
pub trait PaymentGateway {
    /// Ask the provider about a transaction reference.
    fn verify(
        &self,
        transaction_id: &str,
    ) -> impl Future<Output = Result<Verification, PaymentError>> + Send;
}

/// Stripe payment-intent verification over the REST API.
#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: secrecy::SecretString,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    status: String,
    last_payment_error: Option<PaymentIntentError>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: Option<StripeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    /// Create a gateway client from configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
        }
    }
}

impl PaymentGateway for StripeGateway {
    async fn verify(&self, transaction_id: &str) -> Result<Verification, PaymentError> {
        let url = format!("{}/v1/payment_intents/{transaction_id}", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::UnknownTransaction(transaction_id.to_owned()));
        }
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unexpected gateway response".to_owned());
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        if intent.status == "succeeded" {
            return Ok(Verification::Succeeded);
        }

        let reason = intent
            .last_payment_error
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("payment intent is {}", intent.status));
        Ok(Verification::Failed { reason })
    }
}
