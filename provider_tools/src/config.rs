use std::time::Duration;

use dpg_common::Secret;
use log::*;

/// The bound on every outbound provider call. A provider that takes longer than this is treated as
/// unavailable and nothing in the ledger is touched.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Clone)]
pub struct CardGatewayConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for CardGatewayConfig {
    fn default() -> Self {
        Self { api_url: String::default(), api_key: Secret::default(), timeout: DEFAULT_PROVIDER_TIMEOUT }
    }
}

impl CardGatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("DPG_CARD_API_URL").unwrap_or_else(|_| {
            warn!("DPG_CARD_API_URL not set, using a useless default");
            "https://card-gateway.invalid/v1".to_string()
        });
        let api_key = Secret::new(std::env::var("DPG_CARD_API_KEY").unwrap_or_else(|_| {
            warn!("DPG_CARD_API_KEY not set, using a useless default");
            "sk_00000000000000".to_string()
        }));
        Self { api_url, api_key, timeout: provider_timeout_from_env() }
    }
}

#[derive(Debug, Clone)]
pub struct QrProviderConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for QrProviderConfig {
    fn default() -> Self {
        Self { api_url: String::default(), api_key: Secret::default(), timeout: DEFAULT_PROVIDER_TIMEOUT }
    }
}

impl QrProviderConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("DPG_QR_API_URL").unwrap_or_else(|_| {
            warn!("DPG_QR_API_URL not set, using a useless default");
            "https://bank-qr.invalid/v1".to_string()
        });
        let api_key = Secret::new(std::env::var("DPG_QR_API_KEY").unwrap_or_else(|_| {
            warn!("DPG_QR_API_KEY not set, using a useless default");
            "qrk_00000000000000".to_string()
        }));
        Self { api_url, api_key, timeout: provider_timeout_from_env() }
    }
}

fn provider_timeout_from_env() -> Duration {
    std::env::var("DPG_PROVIDER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT)
}
