use std::{env, time::Duration};

use gpg_common::{parse_boolean_flag, Secret};
use log::*;

use crate::errors::ServerError;

const DEFAULT_GPG_HOST: &str = "127.0.0.1";
const DEFAULT_GPG_PORT: u16 = 8480;
const DEFAULT_GATEWAY_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
/// The seller's GST registration state, used to pick between the CGST/SGST and IGST splits.
const DEFAULT_SELLER_STATE: &str = "Maharashtra";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The state of the seller's GST registration. Shipments within this state are split
    /// CGST/SGST; everything else is IGST.
    pub seller_state: String,
    /// Payment gateway credentials and verification policy.
    pub gateway: GatewayConfig,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API, used to confirm capture status on the sync path.
    pub api_url: String,
    /// The public API key id issued by the gateway.
    pub key_id: String,
    /// The API key secret. Signs the `{order_id}|{payment_id}` confirmation string.
    pub key_secret: Secret<String>,
    /// The secret the gateway signs webhook bodies with. Distinct from the API key secret.
    pub webhook_secret: Secret<String>,
    // If false, then signature checks are skipped and every call is trusted. Tests only.
    pub hmac_checks: bool,
    /// Per-request timeout for calls out to the gateway API.
    pub api_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GATEWAY_API_URL.to_string(),
            key_id: String::default(),
            key_secret: Secret::default(),
            webhook_secret: Secret::default(),
            hmac_checks: true,
            api_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_GPG_HOST.to_string(),
            port: DEFAULT_GPG_PORT,
            database_url: String::default(),
            seller_state: DEFAULT_SELLER_STATE.to_string(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("GPG_HOST").ok().unwrap_or_else(|| DEFAULT_GPG_HOST.into());
        let port = env::var("GPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for GPG_PORT. {e} Using the default, {DEFAULT_GPG_PORT}, instead."
                    );
                    DEFAULT_GPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_GPG_PORT);
        let database_url = env::var("GPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ GPG_DATABASE_URL is not set. Please set it to the URL for the GPG database.");
            String::default()
        });
        let seller_state = env::var("GPG_SELLER_STATE").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ GPG_SELLER_STATE is not set. Using '{DEFAULT_SELLER_STATE}'. GST splits will be wrong if your \
                 business is registered elsewhere."
            );
            DEFAULT_SELLER_STATE.into()
        });
        let gateway = GatewayConfig::from_env_or_default();
        Self { host, port, database_url, seller_state, gateway }
    }

    /// Fails fast on a configuration that can never verify a payment, rather than limping along
    /// and 401-ing every request at runtime.
    pub fn assert_ready(&self) -> Result<(), ServerError> {
        if self.database_url.is_empty() {
            return Err(ServerError::ConfigurationError("GPG_DATABASE_URL is not set.".to_string()));
        }
        if self.gateway.hmac_checks && self.gateway.key_secret.reveal().is_empty() {
            return Err(ServerError::ConfigurationError(
                "GPG_GATEWAY_KEY_SECRET is not set, so no client confirmation can ever be verified.".to_string(),
            ));
        }
        if self.gateway.hmac_checks && self.gateway.webhook_secret.reveal().is_empty() {
            return Err(ServerError::ConfigurationError(
                "GPG_GATEWAY_WEBHOOK_SECRET is not set, so no webhook delivery can ever be verified.".to_string(),
            ));
        }
        Ok(())
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("GPG_GATEWAY_API_URL").ok().unwrap_or_else(|| DEFAULT_GATEWAY_API_URL.into());
        let key_id = env::var("GPG_GATEWAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ GPG_GATEWAY_KEY_ID is not set. Please set it to the API key id for your gateway account.");
            String::default()
        });
        let key_secret = env::var("GPG_GATEWAY_KEY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ GPG_GATEWAY_KEY_SECRET is not set. Please set it to the API key secret for your gateway.");
            String::default()
        });
        let webhook_secret = env::var("GPG_GATEWAY_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ GPG_GATEWAY_WEBHOOK_SECRET is not set. Please set it to the webhook signing secret configured \
                 in your gateway dashboard."
            );
            String::default()
        });
        let hmac_checks = parse_boolean_flag(env::var("GPG_GATEWAY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!(
                "🚨️🚨️🚨️ Gateway signature checks are DISABLED. Every confirmation and webhook will be trusted as-is. \
                 Never run production like this. 🚨️🚨️🚨️"
            );
        }
        let api_timeout = env::var("GPG_GATEWAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for GPG_GATEWAY_TIMEOUT. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self {
            api_url,
            key_id,
            key_secret: Secret::new(key_secret),
            webhook_secret: Secret::new(webhook_secret),
            hmac_checks,
            api_timeout,
        }
    }
}
