//! Unified API for donor-facing donation flows and ledger queries.

use std::fmt::Debug;

use chrono::Duration;

use crate::{
    db_types::{CampaignTotals, Donation, DonationId, NewDonation, PaymentEventEntry, PaymentProvider},
    traits::{DonationApiError, DonationManagement, LedgerDatabase, LedgerError},
};

/// The `DonationApi` provides a unified API for opening, cancelling and querying donations.
pub struct DonationApi<B> {
    db: B,
}

impl<B: Debug> Debug for DonationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DonationApi ({:?})", self.db)
    }
}

impl<B> DonationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DonationApi<B>
where B: DonationManagement
{
    /// Fetches the donation with the given id. If no donation exists, `None` is returned.
    pub async fn donation(&self, id: &DonationId) -> Result<Option<Donation>, DonationApiError> {
        self.db.fetch_donation(id).await
    }

    /// Fetches the donation correlated with the given provider payment id (the charge alias, for
    /// QR donations).
    pub async fn donation_by_provider_payment_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<Donation>, DonationApiError> {
        self.db.fetch_donation_by_provider_payment_id(provider, provider_payment_id).await
    }

    /// Fetches the aggregate fundraising totals for a campaign.
    pub async fn campaign_totals(&self, campaign_id: i64) -> Result<Option<CampaignTotals>, DonationApiError> {
        self.db.fetch_campaign_totals(campaign_id).await
    }

    /// Fetches the event log entry for a provider payment, if any has been recorded.
    pub async fn event_entry(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEventEntry>, DonationApiError> {
        self.db.fetch_event_entry(provider, provider_payment_id).await
    }

    /// Pending donations for the given provider that are old enough to be worth chasing.
    pub async fn pending_donations(
        &self,
        provider: PaymentProvider,
        older_than: Duration,
    ) -> Result<Vec<Donation>, DonationApiError> {
        self.db.fetch_pending_donations(provider, older_than).await
    }
}

impl<B> DonationApi<B>
where B: LedgerDatabase
{
    /// Opens a new donation in `Pending` status. See [`LedgerDatabase::insert_donation`] for the
    /// validation rules.
    pub async fn new_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError> {
        self.db.insert_donation(donation).await
    }

    /// Records which provider-side object a pending donation corresponds to.
    pub async fn attach_provider_correlation(
        &self,
        id: &DonationId,
        provider: PaymentProvider,
        provider_payment_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Donation, LedgerError> {
        self.db.attach_provider_correlation(id, provider, provider_payment_id, session_id).await
    }

    /// Cancels a donation that has not completed. See [`LedgerDatabase::cancel_donation`].
    pub async fn cancel_donation(&self, id: &DonationId) -> Result<Donation, LedgerError> {
        self.db.cancel_donation(id).await
    }
}
