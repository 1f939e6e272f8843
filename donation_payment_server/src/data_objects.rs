use std::fmt::Display;

use chrono::{DateTime, Utc};
use donation_payment_engine::db_types::{Donation, PaymentMethod};
use dpg_common::Cents;
use provider_tools::QrDepositState;
use serde::{Deserialize, Serialize};

//--------------------------------------  Webhook payloads  ----------------------------------------------------------

/// The body both payment providers POST to their webhook endpoints. The `event` field selects the
/// outcome and `data` carries the payment itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub data: PaymentData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    /// The provider-side payment id. For QR deliveries this is the charge alias.
    pub payment_id: String,
    /// The amount actually charged, in cents. Some providers only report the amount in the
    /// checkout metadata, so this may be absent or zero.
    #[serde(default)]
    pub amount: Option<Cents>,
    #[serde(default)]
    pub currency: Option<String>,
    /// The metadata we attached when the checkout session or charge was created, echoed back.
    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,
    #[serde(default, rename = "sessionId", alias = "stripeSessionId")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub payer_account: Option<String>,
    #[serde(default)]
    pub payer_document: Option<String>,
}

/// The checkout metadata echo. Every field is optional because providers have mangled or dropped
/// this object in the wild; a delivery with no usable correlation still gets logged as an orphan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    #[serde(default)]
    pub donation_id: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    #[serde(default)]
    pub donor_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Cents>,
    #[serde(default)]
    pub tip_amount: Option<Cents>,
}

/// The acknowledgement body webhooks answer with. Providers stop redelivering once they see a 2xx
/// with this shape, so every reconciliation outcome returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { received: true }
    }
}

//--------------------------------------  Donation initiation  -------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonationRequest {
    pub campaign_id: i64,
    #[serde(default)]
    pub donor_id: Option<String>,
    pub amount: Cents,
    #[serde(default)]
    pub tip_amount: Option<Cents>,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonationResponse {
    pub donation: Donation,
    pub payment: PaymentInstructions,
}

/// What the donor has to do next to pay. Card donations get a hosted checkout redirect, QR
/// donations get the code to scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentInstructions {
    #[serde(rename_all = "camelCase")]
    Checkout { session_id: String, redirect_url: String },
    #[serde(rename_all = "camelCase")]
    QrCode { alias: String, qr_code: String, image_url: Option<String> },
}

//--------------------------------------   QR status polling  --------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollData {
    pub status: QrDepositState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PollData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PollResponse {
    pub fn success(data: PollData) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure<S: Display>(error: S) -> Self {
        Self { success: false, data: None, error: Some(error.to_string()) }
    }
}
