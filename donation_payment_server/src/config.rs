use std::env;

use chrono::Duration;
use dpg_common::{parse_boolean_flag, Secret};
use log::*;
use provider_tools::{CardGatewayConfig, QrProviderConfig};

const DEFAULT_DPG_HOST: &str = "127.0.0.1";
const DEFAULT_DPG_PORT: u16 = 8220;
const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 120;
const DEFAULT_SWEEP_GRACE_SECS: i64 = 300;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If false, webhook signature checks are skipped and every delivery is accepted. **DANGER** -
    /// only ever set this on test rigs.
    pub signature_checks: bool,
    pub card: CardConfig,
    pub qr: QrConfig,
    /// How often the background sweep re-checks pending QR donations. Zero disables the worker.
    pub sweep_interval: Duration,
    /// Pending QR donations younger than this are left alone by the sweep, so that the normal
    /// webhook path gets a chance to settle them first.
    pub sweep_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DPG_HOST.to_string(),
            port: DEFAULT_DPG_PORT,
            database_url: String::default(),
            signature_checks: true,
            card: CardConfig::default(),
            qr: QrConfig::default(),
            sweep_interval: Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS),
            sweep_grace: Duration::seconds(DEFAULT_SWEEP_GRACE_SECS),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DPG_HOST").ok().unwrap_or_else(|| DEFAULT_DPG_HOST.into());
        let port = env::var("DPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for DPG_PORT. {e} Using the default, {DEFAULT_DPG_PORT}, instead."
                    );
                    DEFAULT_DPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DPG_PORT);
        let database_url = env::var("DPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ DPG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let signature_checks = parse_boolean_flag(env::var("DPG_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Webhook signature checks are DISABLED. Anyone can mark donations as paid. Do not run a \
                 production instance like this."
            );
        }
        let card = CardConfig::from_env_or_defaults();
        let qr = QrConfig::from_env_or_defaults();
        let (sweep_interval, sweep_grace) = configure_sweep_timings();
        Self { host, port, database_url, signature_checks, card, qr, sweep_interval, sweep_grace }
    }
}

//-------------------------------------------------  CardConfig  ------------------------------------------------------

/// Server-side settings for the card checkout gateway: the outbound API client configuration plus
/// the secret its webhook deliveries are signed with.
#[derive(Clone, Debug, Default)]
pub struct CardConfig {
    pub api: CardGatewayConfig,
    pub webhook_secret: Secret<String>,
}

impl CardConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = CardGatewayConfig::new_from_env_or_default();
        let webhook_secret = env::var("DPG_CARD_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ DPG_CARD_WEBHOOK_SECRET is not set. Please set it to the signing secret for card gateway \
                 webhooks."
            );
            String::default()
        });
        Self { api, webhook_secret: Secret::new(webhook_secret) }
    }
}

//-------------------------------------------------  QrConfig  --------------------------------------------------------

/// Server-side settings for the bank QR provider, mirroring [`CardConfig`].
#[derive(Clone, Debug, Default)]
pub struct QrConfig {
    pub api: QrProviderConfig,
    pub webhook_secret: Secret<String>,
}

impl QrConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = QrProviderConfig::new_from_env_or_default();
        let webhook_secret = env::var("DPG_QR_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ DPG_QR_WEBHOOK_SECRET is not set. Please set it to the signing secret for bank QR webhooks."
            );
            String::default()
        });
        Self { api, webhook_secret: Secret::new(webhook_secret) }
    }
}

fn configure_sweep_timings() -> (Duration, Duration) {
    let sweep_interval = env::var("DPG_QR_SWEEP_INTERVAL_SECS")
        .map_err(|_| {
            info!(
                "🪛️ DPG_QR_SWEEP_INTERVAL_SECS is not set. Using the default value of \
                 {DEFAULT_SWEEP_INTERVAL_SECS} s."
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::seconds)
                .map_err(|e| warn!("🪛️ Invalid configuration value for DPG_QR_SWEEP_INTERVAL_SECS. {e}"))
        })
        .ok()
        .unwrap_or_else(|| Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS));
    let sweep_grace = env::var("DPG_QR_SWEEP_GRACE_SECS")
        .map_err(|_| {
            info!("🪛️ DPG_QR_SWEEP_GRACE_SECS is not set. Using the default value of {DEFAULT_SWEEP_GRACE_SECS} s.")
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::seconds)
                .map_err(|e| warn!("🪛️ Invalid configuration value for DPG_QR_SWEEP_GRACE_SECS. {e}"))
        })
        .ok()
        .unwrap_or_else(|| Duration::seconds(DEFAULT_SWEEP_GRACE_SECS));
    (sweep_interval, sweep_grace)
}
