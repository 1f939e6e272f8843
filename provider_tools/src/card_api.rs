use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};

use crate::{
    config::CardGatewayConfig,
    data_objects::{CheckoutSession, NewCheckoutSession},
    helpers::rest_query,
    ProviderApiError,
};

/// Client for the hosted card checkout gateway.
///
/// The gateway drives the payment itself; this client only opens checkout sessions and hands the
/// donor over to the hosted payment page. Outcomes come back asynchronously via webhooks.
#[derive(Clone)]
pub struct CardGatewayApi {
    config: CardGatewayConfig,
    client: Arc<Client>,
}

impl CardGatewayApi {
    pub fn new(config: CardGatewayConfig) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
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

    /// Creates a hosted checkout session. The returned session carries the redirect URL for the
    /// donor and the session id that later webhook payloads will reference.
    pub async fn create_checkout(&self, checkout: NewCheckoutSession) -> Result<CheckoutSession, ProviderApiError> {
        debug!("📡️ Creating card checkout session for donation {}", checkout.metadata.donation_id);
        let url = self.url("/checkout/sessions");
        let session =
            rest_query::<CheckoutSession, NewCheckoutSession>(&self.client, Method::POST, url, Some(checkout)).await?;
        info!("📡️ Created card checkout session {}", session.id);
        Ok(session)
    }
}
