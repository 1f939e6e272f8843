//! Tests for the QR deposit status endpoint.
//!
//! The provider client in these tests points at a dead port. A successful answer therefore proves
//! the request was served from the ledger alone.
use actix_web::{http::StatusCode, web, web::ServiceConfig};
use donation_payment_engine::{
    db_types::{EventStatus, NewDonation, PayerDetails, PaymentEvent, PaymentMethod, PaymentProvider},
    events::EventProducers,
    DonationApi,
    ReconciliationApi,
    SqliteDatabase,
};
use dpg_common::Cents;
use serde_json::Value;

use super::helpers::{get_request, new_test_ledger, unreachable_qr_api};
use crate::{poller::StatusPoller, routes::QrStatusRoute};

fn configure_with(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let poller = StatusPoller::new(db, EventProducers::default(), unreachable_qr_api());
        cfg.service(QrStatusRoute::<SqliteDatabase>::new()).app_data(web::Data::new(poller));
    }
}

#[actix_web::test]
async fn a_settled_donation_answers_without_a_provider_call() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let recon = ReconciliationApi::new(db.clone(), EventProducers::default());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(2000), PaymentMethod::Qr))
        .await
        .expect("Error opening a donation");
    donations
        .attach_provider_correlation(&donation.id, PaymentProvider::BankQr, Some("qr-alias-1"), None)
        .await
        .expect("Error attaching the charge alias");
    let event = PaymentEvent::new(PaymentProvider::BankQr, "qr-alias-1", EventStatus::Completed, Cents::from(2000))
        .with_donation(donation.id.clone())
        .with_payer(PayerDetails { name: Some("Maria Souza".to_string()), account: None, document: None });
    assert!(recon.reconcile(event).await.expect("Reconciliation failed").is_applied());

    let (status, body) = get_request("/qr/qr-alias-1/status", configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).expect("Invalid JSON response");
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["status"], "completed");
    assert_eq!(response["data"]["payerName"], "Maria Souza");
    assert!(response["data"]["processedAt"].is_string());
}

#[actix_web::test]
async fn an_unsettled_charge_reports_the_provider_outage() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(2000), PaymentMethod::Qr))
        .await
        .expect("Error opening a donation");
    donations
        .attach_provider_correlation(&donation.id, PaymentProvider::BankQr, Some("qr-alias-2"), None)
        .await
        .expect("Error attaching the charge alias");

    let (status, body) = get_request("/qr/qr-alias-2/status", configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let response: Value = serde_json::from_str(&body).expect("Invalid JSON response");
    assert_eq!(response["success"], false);
    let error = response["error"].as_str().expect("Expected an error message");
    assert!(error.starts_with("The payment provider could not be reached."), "Unexpected error: {error}");
}

#[actix_web::test]
async fn an_unknown_alias_is_checked_against_the_provider() {
    let _ = env_logger::try_init().ok();
    let (db, _) = new_test_ledger().await;
    let (status, body) = get_request("/qr/qr-nobody/status", configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let response: Value = serde_json::from_str(&body).expect("Invalid JSON response");
    assert_eq!(response["success"], false);
}
