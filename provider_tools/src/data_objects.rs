use chrono::{DateTime, Utc};
use dpg_common::Cents;
use serde::{Deserialize, Serialize};

use crate::ProviderApiError;

/// Request body for creating a hosted card checkout session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckoutSession {
    pub amount: Cents,
    pub currency: String,
    pub metadata: CheckoutMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

/// Correlation data attached to a checkout session. The gateway echoes this back verbatim in its
/// webhook payloads, which is how events find their way to the right donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    pub donation_id: String,
    pub campaign_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<String>,
    pub amount: Cents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_amount: Option<Cents>,
}

/// A hosted checkout session as returned by the card gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub id: String,
    /// The hosted payment page the donor must be redirected to.
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for creating a bank QR charge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQrCharge {
    pub amount: Cents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form correlation data. Not all banks echo it back, so the charge alias remains the
    /// authoritative correlation key for QR payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A bank QR charge. The `alias` is the provider payment id for everything that follows: deposit
/// status checks, webhook payloads and the event log key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCharge {
    pub alias: String,
    /// The copy-and-paste representation of the QR code.
    pub qr_code: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// The deposit status of a QR charge, as reported by the provider's status API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositStatus {
    pub status: String,
    #[serde(default)]
    pub amount: Option<Cents>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub payer_account: Option<String>,
    #[serde(default)]
    pub payer_document: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl DepositStatus {
    /// Maps the provider's status vocabulary onto the deposit states the gateway understands.
    /// Unknown vocabulary is an error; the caller must never guess a terminal state.
    pub fn state(&self) -> Result<QrDepositState, ProviderApiError> {
        self.status.parse()
    }
}

/// Normalized deposit states for a bank QR charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrDepositState {
    Pending,
    Completed,
    Failed,
    Disabled,
    Expired,
}

impl QrDepositState {
    /// True when no further deposit can arrive for the charge.
    pub fn is_final(&self) -> bool {
        !matches!(self, QrDepositState::Pending)
    }
}

impl std::str::FromStr for QrDepositState {
    type Err = ProviderApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" | "awaiting_payment" | "processing" => Ok(QrDepositState::Pending),
            "paid" | "confirmed" | "completed" => Ok(QrDepositState::Completed),
            "failed" | "refused" => Ok(QrDepositState::Failed),
            "disabled" | "canceled" | "cancelled" => Ok(QrDepositState::Disabled),
            "expired" => Ok(QrDepositState::Expired),
            other => Err(ProviderApiError::UnrecognisedStatus(other.to_string())),
        }
    }
}
