use dpg_common::Cents;
use thiserror::Error;

use crate::{
    db_types::{Donation, DonationId, NewDonation, PaymentEvent, PaymentProvider, ReconciliationOutcome},
    traits::{DonationApiError, DonationManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the donation payment engine.
///
/// This behaviour includes:
/// * Applying payment events to the ledger exactly once, no matter how often they are delivered.
/// * Opening new (pending) donations and attaching provider correlation data to them.
/// * Cancelling donations that have not completed.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone + DonationManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Applies a payment event to the ledger in a single atomic transaction.
    ///
    /// The event log entry for `(provider, provider_payment_id)` acts as the idempotency gate:
    /// * If the pair is already logged as `Completed`, nothing changes and `AlreadyProcessed` is returned. A
    ///   completed payment is never downgraded.
    /// * If the pair is logged as `Failed` and the incoming outcome is `Failed`, this is a duplicate and nothing
    ///   changes.
    /// * A `Failed` entry followed by a `Completed` outcome is an upgrade: the log entry flips to `Completed` and the
    ///   event is applied to the donation.
    ///
    /// Events that cannot be matched to a donation are recorded in the log with an empty donation reference and
    /// `OrphanEvent` is returned. Events for donations that are already `Completed` or `Cancelled` are logged but
    /// leave the donation and its campaign untouched.
    ///
    /// When the event does apply:
    /// * a `Completed` outcome marks the donation completed, fills in provider correlation fields (payment id,
    ///   session id, payer details), settles the tip and total amounts, and rolls the base amount up into the
    ///   campaign totals;
    /// * a `Failed` outcome marks the donation failed. Failure is not terminal; a later completed event for the same
    ///   payment may still upgrade it.
    ///
    /// Any storage error rolls the whole transaction back, so a redelivery can safely start from scratch.
    async fn apply_payment_event(&self, event: PaymentEvent) -> Result<ReconciliationOutcome, LedgerError>;

    /// Opens a new donation in `Pending` status.
    ///
    /// The base amount must be strictly positive and the tip, when present, must not be negative. The campaign must
    /// exist. Campaign totals are *not* touched; only completed payment events move them.
    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError>;

    /// Records which provider-side object a pending donation corresponds to.
    ///
    /// For QR donations this stores the charge alias as the provider payment id. For card donations it stores the
    /// checkout session id; the provider payment id arrives later with the first webhook. If the donation has already
    /// left `Pending` (a webhook can beat this call), the donation is returned unchanged.
    async fn attach_provider_correlation(
        &self,
        id: &DonationId,
        provider: PaymentProvider,
        provider_payment_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Donation, LedgerError>;

    /// Cancels a donation.
    ///
    /// Only `Pending` and `Failed` donations can be cancelled. Cancelling an already cancelled donation is a no-op.
    /// Cancelling a completed donation fails with [`LedgerError::CancelForbidden`]. Campaign totals are never
    /// adjusted by a cancellation, because only completed donations are counted in them.
    async fn cancel_donation(&self, id: &DonationId) -> Result<Donation, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    QueryError(#[from] DonationApiError),
    #[error("Donation {0} does not exist")]
    DonationNotFound(DonationId),
    #[error("Campaign {0} does not exist")]
    CampaignNotFound(i64),
    #[error("Donation amounts must be positive. Got {0}")]
    InvalidAmount(Cents),
    #[error("Donation {0} has completed and can no longer be cancelled")]
    CancelForbidden(DonationId),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
