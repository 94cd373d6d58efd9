//! The REST client for the upstream payment gateway.
//!
//! A valid signature on the sync path proves the confirmation came from the gateway's checkout
//! flow, but not that the money is actually in. The capture status lives with the gateway, so the
//! verifier calls back to `GET /payments/{id}` before an order is marked paid. Webhook deliveries
//! skip this hop: their body is signed by the gateway itself and already carries the status.

use std::time::Duration;

use log::*;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GatewayConfig;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway could not be reached, or did not answer in time. The caller should report
    /// "verification unavailable" rather than "payment failed".
    #[error("The payment gateway is unreachable. {0}")]
    Unavailable(String),
    #[error("The gateway has no record of payment {0}")]
    PaymentNotFound(String),
    #[error("The gateway returned a response we could not interpret. {0}")]
    InvalidResponse(String),
}

/// The slice of the gateway's payment record the verifier cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
}

impl GatewayPayment {
    /// Whether the money is actually secured. `captured` is settled; `authorized` is reserved and
    /// will be captured automatically.
    pub fn is_settled(&self) -> bool {
        matches!(self.status.as_str(), "captured" | "authorized")
    }
}

/// Fetching payment records is behind a trait so endpoint tests can stand in a mock and exercise
/// the verifier without network access.
#[allow(async_fn_in_trait)]
pub trait GatewayClient {
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct RestGatewayClient {
    client: reqwest::Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RestGatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.reveal().clone(),
        })
    }
}

impl GatewayClient for RestGatewayClient {
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = format!("{}/payments/{payment_id}", self.api_url);
        trace!("🌐️ Fetching payment record from {url}");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    warn!("🌐️ Gateway did not respond: {e}");
                    GatewayError::Unavailable(e.to_string())
                } else {
                    GatewayError::InvalidResponse(e.to_string())
                }
            })?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::PaymentNotFound(payment_id.to_string()));
        }
        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!("Gateway returned {status}")));
        }
        if !status.is_success() {
            return Err(GatewayError::InvalidResponse(format!("Gateway returned {status}")));
        }
        response.json::<GatewayPayment>().await.map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}
