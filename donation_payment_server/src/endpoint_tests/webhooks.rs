//! Full-stack webhook delivery tests: signature middleware, payload handling and reconciliation
//! against a real throwaway ledger, exactly as wired in [`crate::server`].
use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use donation_payment_engine::{
    db_types::{NewDonation, PaymentMethod, PaymentProvider, PaymentStatus},
    events::EventProducers,
    DonationApi,
    ReconciliationApi,
    SqliteDatabase,
};
use dpg_common::{Cents, Secret};
use serde_json::json;

use super::helpers::{new_test_ledger, post_request};
use crate::{
    helpers::{sign_webhook_payload, sign_webhook_payload_timestamped},
    middleware::SignatureMiddlewareFactory,
    webhook_routes::{CardWebhookRoute, QrWebhookRoute},
};

const CARD_SECRET: &str = "whsec_card_test";
const QR_SECRET: &str = "whsec_qr_test";
const ACK: &str = r#"{"received":true}"#;

fn configure_with(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let card_scope = web::scope("/webhook/card")
            .wrap(SignatureMiddlewareFactory::new(Secret::new(CARD_SECRET.to_string()), true))
            .service(CardWebhookRoute::<SqliteDatabase>::new());
        let qr_scope = web::scope("/webhook/qr")
            .wrap(SignatureMiddlewareFactory::new(Secret::new(QR_SECRET.to_string()), true))
            .service(QrWebhookRoute::<SqliteDatabase>::new());
        cfg.service(card_scope)
            .service(qr_scope)
            .app_data(web::Data::new(ReconciliationApi::new(db.clone(), EventProducers::default())))
            .app_data(web::Data::new(DonationApi::new(db)));
    }
}

fn card_completed_body(donation_id: &str, payment_id: &str, amount: i64) -> String {
    json!({
        "event": "payment.completed",
        "data": {
            "paymentId": payment_id,
            "amount": amount,
            "currency": "BRL",
            "sessionId": "cs_test_1",
            "metadata": { "donationId": donation_id, "campaignId": 1 }
        }
    })
    .to_string()
}

fn signed(secret: &str, body: &str) -> Vec<(&'static str, String)> {
    vec![("X-Webhook-Signature", sign_webhook_payload(secret, body.as_bytes()))]
}

#[actix_web::test]
async fn signed_completed_delivery_settles_the_donation() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(5000), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");

    let body = card_completed_body(donation.id.as_str(), "pi_100", 5000);
    let mut headers = signed(CARD_SECRET, &body);
    headers.push(("X-Webhook-Event", "payment.completed".to_string()));
    headers.push(("X-Webhook-Id", "dlv_0001".to_string()));
    let (status, response) =
        post_request("/webhook/card/payment", body, &headers, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, ACK);

    let donation = donations.donation(&donation.id).await.unwrap().unwrap();
    assert_eq!(donation.status, PaymentStatus::Completed);
    assert_eq!(donation.provider_payment_id.as_deref(), Some("pi_100"));
    let totals = donations.campaign_totals(campaign_id).await.unwrap().unwrap();
    assert_eq!(totals.collected_amount, Cents::from(5000));
}

#[actix_web::test]
async fn timestamped_signatures_are_accepted() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(2500), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");

    let body = card_completed_body(donation.id.as_str(), "pi_101", 2500);
    let header = sign_webhook_payload_timestamped(CARD_SECRET, Utc::now().timestamp(), body.as_bytes());
    let headers = vec![("X-Webhook-Signature", header)];
    let (status, response) =
        post_request("/webhook/card/payment", body, &headers, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, ACK);
    let donation = donations.donation(&donation.id).await.unwrap().unwrap();
    assert_eq!(donation.status, PaymentStatus::Completed);
}

#[actix_web::test]
async fn tampered_payloads_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(5000), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");

    let body = card_completed_body(donation.id.as_str(), "pi_102", 5000);
    let headers = signed(CARD_SECRET, &body);
    let tampered = body.replace("5000", "1");
    let err =
        post_request("/webhook/card/payment", tampered, &headers, configure_with(db)).await.expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");
    // The delivery never reached the ledger.
    let donation = donations.donation(&donation.id).await.unwrap().unwrap();
    assert_eq!(donation.status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn unsigned_deliveries_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let body = card_completed_body("dn-whatever", "pi_103", 5000);
    let _ = campaign_id;
    let err = post_request("/webhook/card/payment", body, &[], configure_with(db)).await.expect_err("Expected error");
    assert_eq!(err, "No webhook signature found.");
}

#[actix_web::test]
async fn a_card_signed_delivery_is_rejected_by_the_qr_endpoint() {
    let _ = env_logger::try_init().ok();
    let (db, _) = new_test_ledger().await;
    let body = card_completed_body("dn-whatever", "pi_104", 5000);
    let headers = signed(CARD_SECRET, &body);
    let err = post_request("/webhook/qr/payment", body, &headers, configure_with(db)).await.expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");
}

#[actix_web::test]
async fn unsupported_event_types_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, _) = new_test_ledger().await;
    let body = json!({
        "event": "payment.refunded",
        "data": { "paymentId": "pi_105", "amount": 5000 }
    })
    .to_string();
    let headers = signed(CARD_SECRET, &body);
    let (status, response) =
        post_request("/webhook/card/payment", body, &headers, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response,
        r#"{"error":"Could not interpret the request payload. Unsupported webhook event: payment.refunded"}"#
    );
}

#[actix_web::test]
async fn orphan_deliveries_are_acknowledged_and_logged() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());

    let body = card_completed_body("dn-doesnotexist", "pi_orphan", 900);
    let headers = signed(CARD_SECRET, &body);
    let (status, response) =
        post_request("/webhook/card/payment", body, &headers, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, ACK);

    let entry = donations.event_entry(PaymentProvider::Card, "pi_orphan").await.unwrap().unwrap();
    assert_eq!(entry.donation_id, None);
    let totals = donations.campaign_totals(campaign_id).await.unwrap().unwrap();
    assert_eq!(totals.collected_amount, Cents::from(0));
}

#[actix_web::test]
async fn duplicate_deliveries_change_nothing() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(5000), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");

    let body = card_completed_body(donation.id.as_str(), "pi_dup", 5000);
    let headers = signed(CARD_SECRET, &body);
    for _ in 0..2 {
        let (status, response) =
            post_request("/webhook/card/payment", body.clone(), &headers, configure_with(db.clone()))
                .await
                .expect("Request failed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response, ACK);
    }

    let totals = donations.campaign_totals(campaign_id).await.unwrap().unwrap();
    assert_eq!(totals.collected_amount, Cents::from(5000));
    assert_eq!(totals.donor_count, 1);
}

#[actix_web::test]
async fn qr_deliveries_correlate_through_the_charge_alias() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(2000), PaymentMethod::Qr))
        .await
        .expect("Error opening a donation");
    donations
        .attach_provider_correlation(&donation.id, PaymentProvider::BankQr, Some("qr-alias-3"), None)
        .await
        .expect("Error attaching the charge alias");

    // QR deliveries carry no metadata echo. The alias is the only correlation handle.
    let body = json!({
        "event": "payment.completed",
        "data": {
            "paymentId": "qr-alias-3",
            "amount": 2000,
            "payerName": "Maria Souza",
            "payerDocument": "***.456.789-**"
        }
    })
    .to_string();
    let headers = signed(QR_SECRET, &body);
    let (status, response) =
        post_request("/webhook/qr/payment", body, &headers, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, ACK);

    let donation = donations.donation(&donation.id).await.unwrap().unwrap();
    assert_eq!(donation.status, PaymentStatus::Completed);
    assert_eq!(donation.payer_name.as_deref(), Some("Maria Souza"));
    let totals = donations.campaign_totals(campaign_id).await.unwrap().unwrap();
    assert_eq!(totals.collected_amount, Cents::from(2000));
}

#[actix_web::test]
async fn failure_and_late_success_deliveries_upgrade_the_donation() {
    let _ = env_logger::try_init().ok();
    let (db, campaign_id) = new_test_ledger().await;
    let donations = DonationApi::new(db.clone());
    let donation = donations
        .new_donation(NewDonation::new(campaign_id, Cents::from(3000), PaymentMethod::CreditCard))
        .await
        .expect("Error opening a donation");

    let failed = json!({
        "event": "payment.failed",
        "data": { "paymentId": "pi_retry", "metadata": { "donationId": donation.id.as_str() } }
    })
    .to_string();
    let headers = signed(CARD_SECRET, &failed);
    let (status, _) = post_request("/webhook/card/payment", failed, &headers, configure_with(db.clone()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(donations.donation(&donation.id).await.unwrap().unwrap().status, PaymentStatus::Failed);

    let completed = card_completed_body(donation.id.as_str(), "pi_retry", 3000);
    let headers = signed(CARD_SECRET, &completed);
    let (status, _) =
        post_request("/webhook/card/payment", completed, &headers, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(donations.donation(&donation.id).await.unwrap().unwrap().status, PaymentStatus::Completed);
    let totals = donations.campaign_totals(campaign_id).await.unwrap().unwrap();
    assert_eq!(totals.collected_amount, Cents::from(3000));
}
