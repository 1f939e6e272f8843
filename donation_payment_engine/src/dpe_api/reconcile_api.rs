use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Donation, PaymentEvent, PaymentStatus, ReconciliationOutcome},
    events::{DonationCompletedEvent, DonationFailedEvent, EventProducers},
    traits::{LedgerDatabase, LedgerError},
};

/// `ReconciliationApi` is the primary API for applying payment events to the donation ledger in response to
/// provider webhook deliveries and poller observations.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReconciliationApi<B>
where B: LedgerDatabase
{
    /// Submit a payment event for reconciliation.
    ///
    /// Events may arrive any number of times and in any order; the engine applies each underlying payment exactly
    /// once. All three outcomes are successes from the caller's point of view. A delivery should only be retried
    /// (by answering the provider with an error) when this returns `Err`, which signals a storage failure that
    /// rolled the whole event back.
    pub async fn reconcile(&self, event: PaymentEvent) -> Result<ReconciliationOutcome, LedgerError> {
        let provider = event.provider;
        let pid = event.provider_payment_id.clone();
        let outcome = self.db.apply_payment_event(event).await?;
        match &outcome {
            ReconciliationOutcome::Applied { donation } => {
                debug!("🔁️ Event [{provider}/{pid}] applied. Donation {} is now {}", donation.id, donation.status);
                match donation.status {
                    PaymentStatus::Completed => self.call_donation_completed_hook(donation).await,
                    PaymentStatus::Failed => self.call_donation_failed_hook(donation).await,
                    _ => {},
                }
            },
            ReconciliationOutcome::AlreadyProcessed => {
                debug!("🔁️ Event [{provider}/{pid}] had already been processed. The ledger is unchanged");
            },
            ReconciliationOutcome::OrphanEvent => {
                info!("🔁️ Event [{provider}/{pid}] could not be matched to a donation and was logged for review");
            },
        }
        Ok(outcome)
    }

    async fn call_donation_completed_hook(&self, donation: &Donation) {
        for emitter in &self.producers.donation_completed_producer {
            debug!("🔁️ Notifying donation completed hook subscribers");
            let event = DonationCompletedEvent::new(donation.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_donation_failed_hook(&self, donation: &Donation) {
        for emitter in &self.producers.donation_failed_producer {
            debug!("🔁️ Notifying donation failed hook subscribers");
            let event = DonationFailedEvent::new(donation.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
