use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::ProviderApiError;

/// Sends a JSON REST request and decodes the response body, converting non-2xx responses into
/// [`ProviderApiError::QueryError`].
pub(crate) async fn rest_query<T: DeserializeOwned, B: Serialize>(
    client: &Client,
    method: Method,
    url: String,
    body: Option<B>,
) -> Result<T, ProviderApiError> {
    trace!("📡️ Sending REST query: {url}");
    let mut req = client.request(method, url);
    if let Some(body) = body {
        req = req.json(&body);
    }
    let response = req.send().await.map_err(|e| ProviderApiError::ResponseError(e.to_string()))?;
    if response.status().is_success() {
        trace!("📡️ REST query successful. {}", response.status());
        response.json::<T>().await.map_err(|e| ProviderApiError::JsonError(e.to_string()))
    } else {
        let status = response.status().as_u16();
        let message = response.text().await.map_err(|e| ProviderApiError::ResponseError(e.to_string()))?;
        Err(ProviderApiError::QueryError { status, message })
    }
}
