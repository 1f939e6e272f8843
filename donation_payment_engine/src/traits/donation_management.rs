use chrono::Duration;
use thiserror::Error;

use crate::db_types::{CampaignTotals, Donation, DonationId, PaymentEventEntry, PaymentProvider};

#[derive(Debug, Clone, Error)]
pub enum DonationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for DonationApiError {
    fn from(e: sqlx::Error) -> Self {
        DonationApiError::DatabaseError(e.to_string())
    }
}

/// The `DonationManagement` trait defines the read side of the ledger.
///
/// The [`super::LedgerDatabase`] trait handles the actual machinery of applying payment events to donations and
/// campaigns. `DonationManagement` provides methods for querying the resulting state: individual donations, campaign
/// fundraising totals, and the event log itself.
#[allow(async_fn_in_trait)]
pub trait DonationManagement {
    /// Fetches the donation with the given id. If no donation exists, `None` is returned.
    async fn fetch_donation(&self, id: &DonationId) -> Result<Option<Donation>, DonationApiError>;

    /// Fetches the donation correlated with the given provider payment id. For QR donations the
    /// provider payment id is the charge alias, so this is how the status poller finds its
    /// donation record.
    async fn fetch_donation_by_provider_payment_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<Donation>, DonationApiError>;

    /// Fetches the aggregate fundraising totals for a campaign.
    async fn fetch_campaign_totals(&self, campaign_id: i64) -> Result<Option<CampaignTotals>, DonationApiError>;

    /// Fetches the event log entry for the given provider payment, if one has been recorded.
    async fn fetch_event_entry(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEventEntry>, DonationApiError>;

    /// Fetches pending donations for the given provider that were created at least `older_than`
    /// ago and have a provider payment id to poll against. The background sweep uses this to find
    /// QR charges whose webhooks may have gone missing.
    async fn fetch_pending_donations(
        &self,
        provider: PaymentProvider,
        older_than: Duration,
    ) -> Result<Vec<Donation>, DonationApiError>;
}
