use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::QrProviderConfig,
    data_objects::{DepositStatus, NewQrCharge, QrCharge},
    helpers::rest_query,
    ProviderApiError,
};

/// Client for the bank QR (instant transfer) provider.
///
/// The bank assigns each charge an alias, which doubles as the provider payment id. Its webhook
/// delivery is best-effort, so the gateway also pulls deposit status through this client (donor
/// status checks and the background sweep).
#[derive(Clone)]
pub struct QrProviderApi {
    config: QrProviderConfig,
    client: Arc<Client>,
}

impl QrProviderApi {
    pub fn new(config: QrProviderConfig) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("X-Api-Key", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Creates a QR charge for the given amount. The returned alias is the correlation key for
    /// everything that follows.
    pub async fn create_charge(&self, charge: NewQrCharge) -> Result<QrCharge, ProviderApiError> {
        #[derive(Serialize)]
        struct ChargeInput {
            charge: NewQrCharge,
        }
        #[derive(Deserialize)]
        struct ChargeResponse {
            charge: QrCharge,
        }
        debug!("📡️ Creating QR charge for {}", charge.amount);
        let input = ChargeInput { charge };
        let result =
            rest_query::<ChargeResponse, ChargeInput>(&self.client, Method::POST, self.url("/charges"), Some(input))
                .await?;
        info!("📡️ Created QR charge {}", result.charge.alias);
        Ok(result.charge)
    }

    /// Fetches the current deposit status of a charge.
    pub async fn deposit_status(&self, alias: &str) -> Result<DepositStatus, ProviderApiError> {
        #[derive(Deserialize)]
        struct DepositResponse {
            deposit: DepositStatus,
        }
        let path = format!("/charges/{alias}/deposit");
        debug!("📡️ Fetching deposit status for QR charge {alias}");
        let result = rest_query::<DepositResponse, ()>(&self.client, Method::GET, self.url(&path), None).await?;
        debug!("📡️ QR charge {alias} deposit status: {}", result.deposit.status);
        Ok(result.deposit)
    }

    /// Disables a charge so that no further deposits are accepted against it.
    pub async fn disable_charge(&self, alias: &str) -> Result<QrCharge, ProviderApiError> {
        #[derive(Deserialize)]
        struct ChargeResponse {
            charge: QrCharge,
        }
        let path = format!("/charges/{alias}");
        debug!("📡️ Disabling QR charge {alias}");
        let result = rest_query::<ChargeResponse, ()>(&self.client, Method::DELETE, self.url(&path), None).await?;
        info!("📡️ Disabled QR charge {alias}");
        Ok(result.charge)
    }
}
