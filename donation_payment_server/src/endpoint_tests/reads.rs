use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use donation_payment_engine::{
    db_types::{CampaignTotals, Donation, DonationId, PaymentMethod, PaymentProvider, PaymentStatus},
    DonationApi,
};
use dpg_common::Cents;

use super::helpers::get_request;
use crate::{
    endpoint_tests::mocks::MockDonationManager,
    routes::{CampaignTotalsRoute, DonationRoute},
};

#[actix_web::test]
async fn fetch_donation() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/donations/dn-cafe000012345678", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, DONATION_JSON);
}

#[actix_web::test]
async fn fetch_missing_donation() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/donations/dn-missing", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Donation dn-missing does not exist"}"#);
}

#[actix_web::test]
async fn fetch_campaign_totals() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/campaigns/42/totals", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":42,"goalAmount":100000,"collectedAmount":25000,"donorCount":3,"percentageFunded":25.0}"#);
}

#[actix_web::test]
async fn fetch_missing_campaign_totals() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/campaigns/999/totals", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Campaign 999 does not exist"}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut ledger = MockDonationManager::new();
    ledger
        .expect_fetch_donation()
        .returning(|id| if id.as_str() == "dn-missing" { Ok(None) } else { Ok(Some(donation_response())) });
    ledger.expect_fetch_campaign_totals().returning(|id| {
        if id == 42 {
            Ok(Some(CampaignTotals {
                id: 42,
                goal_amount: Cents::from(100_000),
                collected_amount: Cents::from(25_000),
                donor_count: 3,
                percentage_funded: 25.0,
            }))
        } else {
            Ok(None)
        }
    });
    let donations_api = DonationApi::new(ledger);
    cfg.service(DonationRoute::<MockDonationManager>::new())
        .service(CampaignTotalsRoute::<MockDonationManager>::new())
        .app_data(web::Data::new(donations_api));
}

// Mock response to `fetch_donation` calls
fn donation_response() -> Donation {
    Donation {
        id: DonationId::from("dn-cafe000012345678".to_string()),
        campaign_id: 42,
        donor_id: Some("user-981".to_string()),
        amount: Cents::from(5000),
        tip_amount: Some(Cents::from(500)),
        total_amount: Some(Cents::from(5500)),
        status: PaymentStatus::Completed,
        provider: Some(PaymentProvider::Card),
        method: PaymentMethod::CreditCard,
        provider_payment_id: Some("pay_01HXYZ".to_string()),
        session_id: Some("cs_test_123".to_string()),
        payer_name: None,
        payer_account: None,
        payer_document: None,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 31, 30).unwrap(),
    }
}

const DONATION_JSON: &str = r#"{"id":"dn-cafe000012345678","campaignId":42,"donorId":"user-981","amount":5000,"tipAmount":500,"totalAmount":5500,"status":"completed","provider":"card","method":"credit_card","providerPaymentId":"pay_01HXYZ","sessionId":"cs_test_123","payerName":null,"payerAccount":null,"payerDocument":null,"createdAt":"2026-03-01T09:30:00Z","updatedAt":"2026-03-01T09:31:30Z"}"#;
