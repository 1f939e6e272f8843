//! Webhook handlers for the payment providers.
//!
//! Both providers POST the same payload shape (see [`crate::data_objects::WebhookPayload`]), but each provider gets
//! its own endpoint so that each scope can be wrapped with its own signing secret. By the time a handler runs, the
//! signature middleware has already authenticated the delivery.
//!
//! Deliveries are duplicated, reordered and replayed by the providers as a matter of course. The handlers stay
//! deliberately thin: turn the payload into a [`PaymentEvent`] and hand it to the reconciliation engine, which owns
//! every idempotency and ordering decision. All three reconciliation outcomes acknowledge the delivery with a 200,
//! because anything else only provokes a redelivery of an event the log already holds.

use actix_web::{web, HttpResponse};
use donation_payment_engine::{
    db_types::{DonationId, EventStatus, PayerDetails, PaymentEvent, PaymentProvider, ReconciliationOutcome},
    traits::LedgerDatabase,
    DonationApi,
    ReconciliationApi,
};
use log::*;
use serde_json::Value;

use crate::{
    data_objects::{WebhookAck, WebhookPayload},
    errors::ServerError,
    route,
};

route!(card_webhook => Post "/payment" impl LedgerDatabase);
/// Route handler for card gateway payment webhooks
///
/// Card payments correlate through the checkout metadata echo, which carries the donation id that was attached
/// when the session was created. A delivery whose echo got lost is logged as an orphan and acknowledged.
pub async fn card_webhook<B: LedgerDatabase>(
    body: web::Json<Value>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    let event = webhook_payment_event(PaymentProvider::Card, &payload)?;
    process_payment_event(event, api.as_ref()).await
}

route!(qr_webhook => Post "/payment" impl LedgerDatabase);
/// Route handler for bank QR payment webhooks
///
/// QR deliveries often arrive without any metadata echo. The charge alias doubles as the provider payment id and
/// was stored on the donation when the charge was created, so it fills the correlation gap here before the event
/// reaches the engine.
pub async fn qr_webhook<B: LedgerDatabase>(
    body: web::Json<Value>,
    api: web::Data<ReconciliationApi<B>>,
    donations: web::Data<DonationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    let mut event = webhook_payment_event(PaymentProvider::BankQr, &payload)?;
    if event.donation_id.is_none() {
        let matched =
            donations.donation_by_provider_payment_id(PaymentProvider::BankQr, &event.provider_payment_id).await?;
        if let Some(donation) = matched {
            debug!(
                "💳️ QR event {} matched to donation {} through its charge alias",
                event.provider_payment_id, donation.id
            );
            event = event.with_donation(donation.id);
        }
    }
    process_payment_event(event, api.as_ref()).await
}

/// Converts a webhook payload into the engine's event type. The raw payload rides along as event metadata, so the
/// event log keeps an exact record of what the provider sent.
fn webhook_payment_event(provider: PaymentProvider, payload: &Value) -> Result<PaymentEvent, ServerError> {
    let parsed = serde_json::from_value::<WebhookPayload>(payload.clone()).map_err(|e| {
        warn!("💳️ Could not interpret {provider} webhook delivery. {e}");
        ServerError::MalformedPayload(format!("Could not interpret webhook payload. {e}"))
    })?;
    let outcome = match parsed.event.as_str() {
        "payment.completed" => EventStatus::Completed,
        "payment.failed" => EventStatus::Failed,
        other => {
            info!("💳️ Rejecting unsupported {provider} webhook event type: {other}");
            return Err(ServerError::MalformedPayload(format!("Unsupported webhook event: {other}")));
        },
    };
    let data = parsed.data;
    debug!("💳️ {provider} delivery for payment {}: {}", data.payment_id, parsed.event);
    let mut event = PaymentEvent::new(provider, data.payment_id, outcome, data.amount.unwrap_or_default())
        .with_metadata(payload.clone());
    if let Some(currency) = data.currency {
        event = event.with_currency(currency);
    }
    if let Some(session_id) = data.session_id {
        event = event.with_session(session_id);
    }
    if data.payer_name.is_some() || data.payer_account.is_some() || data.payer_document.is_some() {
        event = event.with_payer(PayerDetails {
            name: data.payer_name,
            account: data.payer_account,
            document: data.payer_document,
        });
    }
    if let Some(metadata) = data.metadata {
        if let Some(donation_id) = metadata.donation_id {
            event = event.with_donation(DonationId::from(donation_id));
        }
        if let Some(tip) = metadata.tip_amount {
            event = event.with_tip(tip);
        }
    }
    Ok(event)
}

async fn process_payment_event<B: LedgerDatabase>(
    event: PaymentEvent,
    api: &ReconciliationApi<B>,
) -> Result<HttpResponse, ServerError> {
    let provider = event.provider;
    let pid = event.provider_payment_id.clone();
    // An Err here means the transaction rolled back, and a retried delivery can start from scratch.
    let outcome = api.reconcile(event).await.map_err(|e| {
        error!("💳️ Could not apply event [{provider}/{pid}] to the ledger. The delivery will be retried. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    match outcome {
        ReconciliationOutcome::Applied { donation } => {
            info!("💳️ Event [{provider}/{pid}] applied. Donation {} is now {}", donation.id, donation.status);
        },
        ReconciliationOutcome::AlreadyProcessed => {
            info!("💳️ Event [{provider}/{pid}] was a duplicate delivery. Acknowledged without changes");
        },
        ReconciliationOutcome::OrphanEvent => {
            warn!("💳️ Event [{provider}/{pid}] did not match any donation. Logged as an orphan and acknowledged");
        },
    }
    Ok(HttpResponse::Ok().json(WebhookAck::ok()))
}
