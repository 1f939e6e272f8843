use chrono::Duration;
use donation_payment_engine::{
    db_types::{CampaignTotals, Donation, DonationId, PaymentEventEntry, PaymentProvider},
    traits::{DonationApiError, DonationManagement},
};
use mockall::mock;

mock! {
    pub DonationManager {}
    impl DonationManagement for DonationManager {
        async fn fetch_donation(&self, id: &DonationId) -> Result<Option<Donation>, DonationApiError>;
        async fn fetch_donation_by_provider_payment_id(&self, provider: PaymentProvider, provider_payment_id: &str) -> Result<Option<Donation>, DonationApiError>;
        async fn fetch_campaign_totals(&self, campaign_id: i64) -> Result<Option<CampaignTotals>, DonationApiError>;
        async fn fetch_event_entry(&self, provider: PaymentProvider, provider_payment_id: &str) -> Result<Option<PaymentEventEntry>, DonationApiError>;
        async fn fetch_pending_donations(&self, provider: PaymentProvider, older_than: Duration) -> Result<Vec<Donation>, DonationApiError>;
    }
}
