use actix_web::{http::StatusCode, web, web::ServiceConfig};
use donation_payment_engine::{
    db_types::{EventStatus, NewDonation, PaymentEvent, PaymentMethod, PaymentProvider},
    events::EventProducers,
    DonationApi,
    ReconciliationApi,
    SqliteDatabase,
};
use dpg_common::Cents;
use serde_json::{json, Value};

use super::helpers::{new_test_ledger, post_request, unreachable_card_api, unreachable_qr_api};
use crate::routes::{CancelDonationRoute, DonationRoute, NewDonationRoute};

fn configure_with(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(DonationRoute::<SqliteDatabase>::new())
            .service(NewDonationRoute::<SqliteDatabase>::new())
            .service(CancelDonationRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(DonationApi::new(db)))
            .app_data(web::Data::new(unreachable_card_api()))
            .app_data(web::Data::new(unreachable_qr_api()));
    }
}

#[actix_web::test]
async fn cancel_pending_donation() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(5000), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");

    let path = format!("/donations/{}/cancel", donation.id);
    let (status, body) = post_request(&path, String::new(), &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let cancelled: Value = serde_json::from_str(&body).expect("Invalid JSON response");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["id"], donation.id.as_str());
}

#[actix_web::test]
async fn cancel_missing_donation() {
    let _ = env_logger::try_init().ok();
    let (db, _) = new_test_ledger().await;
    let (status, body) =
        post_request("/donations/dn-missing/cancel", String::new(), &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Donation dn-missing does not exist"}"#);
}

#[actix_web::test]
async fn cancel_completed_donation_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let recon = ReconciliationApi::new(db.clone(), EventProducers::default());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(5000), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");
    let event = PaymentEvent::new(PaymentProvider::Card, "pi_done", EventStatus::Completed, Cents::from(5000))
        .with_donation(donation.id.clone());
    assert!(recon.reconcile(event).await.expect("Reconciliation failed").is_applied());

    let path = format!("/donations/{}/cancel", donation.id);
    let (status, body) = post_request(&path, String::new(), &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    let expected = format!(
        r#"{{"error":"The donation can no longer be cancelled. Donation {} has completed and can no longer be cancelled"}}"#,
        donation.id
    );
    assert_eq!(body, expected);
}

#[actix_web::test]
async fn cancelling_a_qr_donation_survives_an_unreachable_provider() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(2000), PaymentMethod::Qr))
        .await
        .expect("Error opening a donation");
    donations
        .attach_provider_correlation(&donation.id, PaymentProvider::BankQr, Some("qr-alias-9"), None)
        .await
        .expect("Error attaching the charge alias");

    // The disable-charge call fails against the dead provider, but the cancellation has already committed.
    let path = format!("/donations/{}/cancel", donation.id);
    let (status, body) = post_request(&path, String::new(), &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let cancelled: Value = serde_json::from_str(&body).expect("Invalid JSON response");
    assert_eq!(cancelled["status"], "cancelled");
}

#[actix_web::test]
async fn bank_transfers_cannot_be_initiated() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let body = json!({ "campaignId": campaign_id, "amount": 5000, "method": "bank_transfer" }).to_string();
    let (status, body) = post_request("/donations", body, &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"error":"Could not interpret the request payload. BankTransfer donations are recorded manually and cannot be initiated here"}"#
    );
}

#[actix_web::test]
async fn zero_amount_donations_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let body = json!({ "campaignId": campaign_id, "amount": 0, "method": "credit_card" }).to_string();
    let (status, body) = post_request("/donations", body, &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not interpret the request payload. Donation amounts must be positive. Got 0.00"}"#);
}

#[actix_web::test]
async fn card_initiation_fails_when_the_gateway_is_down() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let body = json!({ "campaignId": campaign_id, "donorId": "user-1", "amount": 5000, "tipAmount": 500, "method": "credit_card" })
        .to_string();
    let (status, body) = post_request("/donations", body, &[], configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.starts_with(r#"{"error":"The payment provider could not be reached."#), "Unexpected body: {body}");
}
