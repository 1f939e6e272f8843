use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dpg_common::Cents;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   PaymentProvider   ---------------------------------------------------------

/// The external payment providers that deliver payment events to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    /// The hosted card checkout gateway.
    Card,
    /// The bank QR (instant transfer) provider.
    BankQr,
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentProvider::Card => write!(f, "Card"),
            PaymentProvider::BankQr => write!(f, "BankQr"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Card" => Ok(Self::Card),
            "BankQr" => Ok(Self::BankQr),
            s => Err(ConversionError(format!("Invalid payment provider: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------

/// How the donor chose to pay. The method determines which provider the donation is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Qr,
    BankTransfer,
}

impl PaymentMethod {
    /// The provider that donations with this method are routed to. Bank transfers are recorded
    /// manually and have no provider.
    pub fn default_provider(&self) -> Option<PaymentProvider> {
        match self {
            PaymentMethod::CreditCard => Some(PaymentProvider::Card),
            PaymentMethod::Qr => Some(PaymentProvider::BankQr),
            PaymentMethod::BankTransfer => None,
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::CreditCard => write!(f, "CreditCard"),
            PaymentMethod::Qr => write!(f, "Qr"),
            PaymentMethod::BankTransfer => write!(f, "BankTransfer"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CreditCard" => Ok(Self::CreditCard),
            "Qr" => Ok(Self::Qr),
            "BankTransfer" => Ok(Self::BankTransfer),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------

/// The lifecycle state of a donation.
///
/// `Pending` is the only initial state. `Completed` and `Cancelled` are terminal. `Failed` is not
/// terminal, because providers can retry a charge and deliver a success after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The donation has been created and no definitive payment event has arrived yet.
    Pending,
    /// A payment completed event has been applied. Terminal.
    Completed,
    /// The most recent payment event was a failure. A later completed event may still upgrade it.
    Failed,
    /// The donor or an admin abandoned the donation. Terminal. Never entered via a provider event.
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Cancelled)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     EventStatus     ---------------------------------------------------------

/// The outcome a payment event reports. Providers only ever tell us that a payment finished or
/// that it failed; everything in between stays `Pending` on the donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Completed,
    Failed,
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Completed => write!(f, "Completed"),
            EventStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid event status: {s}"))),
        }
    }
}

//--------------------------------------      DonationId     ---------------------------------------------------------

/// The internal identifier for a donation. Opaque to providers, but carried in provider metadata
/// so that webhook events can be correlated back to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct DonationId(pub String);

impl DonationId {
    /// Generates a fresh donation id. Ids are random, so they cannot be enumerated by probing the
    /// status endpoints.
    pub fn random() -> Self {
        Self(format!("dn-{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DonationId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for DonationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for DonationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       Donation      ---------------------------------------------------------

/// A single donation towards a campaign, as stored in the ledger.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: DonationId,
    pub campaign_id: i64,
    /// The donor's user id, or `None` for anonymous donations.
    pub donor_id: Option<String>,
    /// The base donation amount. Only this counts towards the campaign total.
    pub amount: Cents,
    /// An optional platform tip on top of the base amount.
    pub tip_amount: Option<Cents>,
    /// The amount the provider actually charged. Populated on completion.
    pub total_amount: Option<Cents>,
    pub status: PaymentStatus,
    pub provider: Option<PaymentProvider>,
    pub method: PaymentMethod,
    /// The provider-side payment id. For QR charges this is the charge alias assigned at creation
    /// time; for card payments it only becomes known when the first webhook arrives.
    pub provider_payment_id: Option<String>,
    /// The card checkout session id, when the donation was initiated through the card gateway.
    pub session_id: Option<String>,
    pub payer_name: Option<String>,
    pub payer_account: Option<String>,
    pub payer_document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewDonation     ---------------------------------------------------------

/// The information needed to open a new (pending) donation in the ledger.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub campaign_id: i64,
    pub donor_id: Option<String>,
    pub amount: Cents,
    pub tip_amount: Option<Cents>,
    pub method: PaymentMethod,
}

impl NewDonation {
    pub fn new(campaign_id: i64, amount: Cents, method: PaymentMethod) -> Self {
        Self { campaign_id, donor_id: None, amount, tip_amount: None, method }
    }

    pub fn with_donor<S: Into<String>>(mut self, donor_id: S) -> Self {
        self.donor_id = Some(donor_id.into());
        self
    }

    pub fn with_tip(mut self, tip: Cents) -> Self {
        self.tip_amount = Some(tip);
        self
    }
}

//--------------------------------------     PayerDetails    ---------------------------------------------------------

/// Payer identification reported by the bank QR provider once a transfer settles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerDetails {
    pub name: Option<String>,
    pub account: Option<String>,
    pub document: Option<String>,
}

//--------------------------------------     PaymentEvent    ---------------------------------------------------------

/// A normalized payment event, ready for reconciliation.
///
/// Both webhook deliveries and poller observations are converted into this shape before they reach
/// the engine. `(provider, provider_payment_id)` is the event's identity: two events with the same
/// pair describe the same provider-side payment, no matter how many times they are delivered.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub provider: PaymentProvider,
    pub provider_payment_id: String,
    pub outcome: EventStatus,
    /// The donation the event claims to belong to, when correlation data was present.
    pub donation_id: Option<DonationId>,
    /// The amount the provider says it charged. Zero when the provider did not report one.
    pub amount: Cents,
    pub currency: String,
    pub tip_amount: Option<Cents>,
    pub session_id: Option<String>,
    pub payer: Option<PayerDetails>,
    /// The raw provider payload, retained in the event log for audit and replay.
    pub metadata: serde_json::Value,
}

impl PaymentEvent {
    pub fn new<S: Into<String>>(provider: PaymentProvider, provider_payment_id: S, outcome: EventStatus, amount: Cents) -> Self {
        Self {
            provider,
            provider_payment_id: provider_payment_id.into(),
            outcome,
            donation_id: None,
            amount,
            currency: dpg_common::DEFAULT_CURRENCY_CODE.to_string(),
            tip_amount: None,
            session_id: None,
            payer: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_donation(mut self, donation_id: DonationId) -> Self {
        self.donation_id = Some(donation_id);
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_tip(mut self, tip: Cents) -> Self {
        self.tip_amount = Some(tip);
        self
    }

    pub fn with_session<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_payer(mut self, payer: PayerDetails) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

//--------------------------------------  PaymentEventEntry  ---------------------------------------------------------

/// A row in the event log. One entry exists per `(provider, provider_payment_id)` pair, holding
/// the most definitive outcome seen so far for that payment.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEventEntry {
    pub id: i64,
    pub provider: PaymentProvider,
    pub provider_payment_id: String,
    pub status: EventStatus,
    /// The donation the event was applied to. `None` for orphan events.
    pub donation_id: Option<DonationId>,
    pub amount: Cents,
    pub currency: String,
    /// The raw provider payload as a JSON string.
    pub metadata: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    CampaignTotals   ---------------------------------------------------------

/// Aggregate fundraising state for a campaign. Maintained by the reconciliation flow so that reads
/// never need to sum over donations.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTotals {
    pub id: i64,
    pub goal_amount: Cents,
    pub collected_amount: Cents,
    pub donor_count: i64,
    pub percentage_funded: f64,
}

//-------------------------------------- ReconciliationOutcome ------------------------------------------------------

/// What happened when a payment event was handed to the engine.
///
/// None of these are errors. Providers redeliver events freely, so `AlreadyProcessed` is business
/// as usual, and an `OrphanEvent` is logged and kept for manual review rather than rejected.
#[derive(Debug, Clone)]
pub enum ReconciliationOutcome {
    /// The event changed the ledger. Carries the donation as it looks after the update.
    Applied { donation: Donation },
    /// A duplicate or out-of-order delivery. The ledger was left untouched.
    AlreadyProcessed,
    /// The event could not be matched to any donation. It was recorded in the event log only.
    OrphanEvent,
}

impl ReconciliationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ReconciliationOutcome::Applied { .. })
    }

    pub fn donation(&self) -> Option<&Donation> {
        match self {
            ReconciliationOutcome::Applied { donation } => Some(donation),
            _ => None,
        }
    }
}
