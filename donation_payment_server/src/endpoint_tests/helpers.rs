use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use donation_payment_engine::{
    test_utils::{
        prepare_env::{prepare_test_env, random_db_url},
        seed_campaign,
    },
    SqliteDatabase,
};
use dpg_common::{Cents, Secret};
use provider_tools::{CardGatewayApi, CardGatewayConfig, QrProviderApi, QrProviderConfig};

pub const TEST_GOAL: i64 = 100_000;

/// A throwaway SQLite ledger with one seeded campaign.
pub async fn new_test_ledger() -> (SqliteDatabase, i64) {
    let url = random_db_url();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to the test database");
    let campaign_id = seed_campaign(&db, "Endpoint test campaign", Cents::from(TEST_GOAL)).await;
    (db, campaign_id)
}

/// Provider clients aimed at a local port nothing listens on. Construction succeeds; any call
/// fails fast with a connection error, which is what the provider-down tests need.
pub fn unreachable_card_api() -> CardGatewayApi {
    let config = CardGatewayConfig {
        api_url: "http://127.0.0.1:19/v1".to_string(),
        api_key: Secret::new("sk_test".to_string()),
        timeout: std::time::Duration::from_secs(2),
    };
    CardGatewayApi::new(config).expect("Error creating the card gateway client")
}

pub fn unreachable_qr_api() -> QrProviderApi {
    let config = QrProviderConfig {
        api_url: "http://127.0.0.1:19/v1".to_string(),
        api_key: Secret::new("qrk_test".to_string()),
        timeout: std::time::Duration::from_secs(2),
    };
    QrProviderApi::new(config).expect("Error creating the bank QR client")
}

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::get().uri(path).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Posts a raw JSON body, so that tests control the exact bytes a signature was calculated over.
pub async fn post_request<F>(
    path: &str,
    body: String,
    headers: &[(&str, String)],
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, value.as_str()));
    }
    let req = req.set_payload(body).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
