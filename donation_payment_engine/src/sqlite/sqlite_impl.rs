//! `SqliteDatabase` is a concrete implementation of a donation ledger backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{campaigns, db_url, donations, new_pool, payment_events};
use crate::{
    db_types::{
        CampaignTotals,
        Donation,
        DonationId,
        EventStatus,
        NewDonation,
        PaymentEvent,
        PaymentEventEntry,
        PaymentProvider,
        PaymentStatus,
        ReconciliationOutcome,
    },
    traits::{DonationApiError, DonationManagement, LedgerDatabase, LedgerError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Applies a payment event to the ledger in a single transaction.
    ///
    /// The event log write is ordered *before* the donation and campaign updates, so a concurrent
    /// duplicate delivery loses the unique-key race on the log and rolls back without touching
    /// anything. Whatever the interleaving, a payment is applied at most once.
    async fn apply_payment_event(&self, event: PaymentEvent) -> Result<ReconciliationOutcome, LedgerError> {
        let provider = event.provider;
        let pid = event.provider_payment_id.clone();
        let mut tx = self.pool.begin().await?;
        let existing = payment_events::fetch_event(provider, &pid, &mut tx).await?;
        match &existing {
            Some(entry) if entry.status == EventStatus::Completed => {
                debug!("🗃️ Event [{provider}/{pid}] is already logged as completed. Nothing to do");
                return Ok(ReconciliationOutcome::AlreadyProcessed);
            },
            Some(_) if event.outcome == EventStatus::Failed => {
                debug!("🗃️ Event [{provider}/{pid}] is a repeated failure delivery. Nothing to do");
                return Ok(ReconciliationOutcome::AlreadyProcessed);
            },
            _ => {},
        }
        // Reaching this point means either the pair has never been logged, or a failed entry is
        // being upgraded to completed.
        let upgrade = existing.is_some();

        let donation = match &event.donation_id {
            Some(id) => donations::fetch_donation(id, &mut tx).await?,
            None => None,
        };
        let Some(donation) = donation else {
            let recorded = if upgrade {
                payment_events::upgrade_to_completed(provider, &pid, &mut tx).await?
            } else {
                payment_events::idempotent_insert(&event, event.outcome, None, &mut tx).await?
            };
            if !recorded {
                tx.rollback().await?;
                debug!("🗃️ Orphan event [{provider}/{pid}] was logged by a concurrent delivery");
                return Ok(ReconciliationOutcome::AlreadyProcessed);
            }
            tx.commit().await?;
            warn!("🗃️ Event [{provider}/{pid}] does not match any donation. Logged as an orphan for review");
            return Ok(ReconciliationOutcome::OrphanEvent);
        };

        if donation.status == PaymentStatus::Completed {
            // A completed donation is never regressed, but the log must reflect the completion.
            let _ = if upgrade {
                payment_events::upgrade_to_completed(provider, &pid, &mut tx).await?
            } else {
                payment_events::idempotent_insert(&event, EventStatus::Completed, Some(&donation.id), &mut tx).await?
            };
            tx.commit().await?;
            debug!("🗃️ Donation {} is already completed. Event [{provider}/{pid}] logged only", donation.id);
            return Ok(ReconciliationOutcome::AlreadyProcessed);
        }
        if donation.status == PaymentStatus::Cancelled {
            let _ = if upgrade {
                payment_events::upgrade_to_completed(provider, &pid, &mut tx).await?
            } else {
                payment_events::idempotent_insert(&event, event.outcome, Some(&donation.id), &mut tx).await?
            };
            tx.commit().await?;
            warn!(
                "🗃️ Donation {} was cancelled but provider events are still arriving for it. Event \
                 [{provider}/{pid}] logged for review",
                donation.id
            );
            return Ok(ReconciliationOutcome::AlreadyProcessed);
        }

        // Claim the log entry before mutating the ledger.
        let claimed = if upgrade {
            payment_events::upgrade_to_completed(provider, &pid, &mut tx).await?
        } else {
            payment_events::idempotent_insert(&event, event.outcome, Some(&donation.id), &mut tx).await?
        };
        if !claimed {
            tx.rollback().await?;
            debug!("🗃️ Event [{provider}/{pid}] was claimed by a concurrent delivery");
            return Ok(ReconciliationOutcome::AlreadyProcessed);
        }

        let donation = match event.outcome {
            EventStatus::Completed => {
                let tip = donation.tip_amount.or(event.tip_amount);
                let total =
                    if event.amount.is_positive() { event.amount } else { donation.amount + tip.unwrap_or_default() };
                let updated = donations::mark_completed(&donation.id, &event, tip, total, &mut tx).await?;
                let totals = campaigns::apply_completed_donation(updated.campaign_id, updated.amount, &mut tx).await?;
                debug!(
                    "🗃️ Campaign {} stands at {} collected from {} donors ({}% funded)",
                    totals.id, totals.collected_amount, totals.donor_count, totals.percentage_funded
                );
                updated
            },
            EventStatus::Failed => donations::mark_failed(&donation.id, provider, &pid, &mut tx).await?,
        };
        tx.commit().await?;
        debug!("🗃️ Event [{provider}/{pid}] applied. Donation {} is now {}", donation.id, donation.status);
        Ok(ReconciliationOutcome::Applied { donation })
    }

    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError> {
        if !donation.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(donation.amount));
        }
        if let Some(tip) = donation.tip_amount {
            if tip.is_negative() {
                return Err(LedgerError::InvalidAmount(tip));
            }
        }
        let mut tx = self.pool.begin().await?;
        let campaign_id = donation.campaign_id;
        if campaigns::fetch_campaign(campaign_id, &mut tx).await?.is_none() {
            return Err(LedgerError::CampaignNotFound(campaign_id));
        }
        let donation = donations::insert_donation(donation, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Donation {} opened (pending) against campaign {campaign_id}", donation.id);
        Ok(donation)
    }

    async fn attach_provider_correlation(
        &self,
        id: &DonationId,
        provider: PaymentProvider,
        provider_payment_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Donation, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match donations::attach_provider_correlation(id, provider, provider_payment_id, session_id, &mut conn).await? {
            Some(donation) => Ok(donation),
            None => {
                // The donation left Pending before the correlation landed. A fast webhook can do
                // that; keep whatever reconciliation wrote.
                let donation =
                    donations::fetch_donation(id, &mut conn).await?.ok_or(LedgerError::DonationNotFound(id.clone()))?;
                debug!("🗃️ Donation {id} is already {}. Correlation update skipped", donation.status);
                Ok(donation)
            },
        }
    }

    async fn cancel_donation(&self, id: &DonationId) -> Result<Donation, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let donation =
            donations::fetch_donation(id, &mut tx).await?.ok_or(LedgerError::DonationNotFound(id.clone()))?;
        match donation.status {
            PaymentStatus::Completed => {
                info!("🗃️ Donation {id} has already completed and cannot be cancelled");
                return Err(LedgerError::CancelForbidden(id.clone()));
            },
            PaymentStatus::Cancelled => {
                debug!("🗃️ Donation {id} is already cancelled. Nothing to do");
                return Ok(donation);
            },
            _ => {},
        }
        let donation =
            donations::mark_cancelled(id, &mut tx).await?.ok_or(LedgerError::CancelForbidden(id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Donation {id} cancelled");
        Ok(donation)
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl DonationManagement for SqliteDatabase {
    async fn fetch_donation(&self, id: &DonationId) -> Result<Option<Donation>, DonationApiError> {
        let mut conn = self.pool.acquire().await?;
        donations::fetch_donation(id, &mut conn).await
    }

    async fn fetch_donation_by_provider_payment_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<Donation>, DonationApiError> {
        let mut conn = self.pool.acquire().await?;
        donations::fetch_donation_by_provider_payment_id(provider, provider_payment_id, &mut conn).await
    }

    async fn fetch_campaign_totals(&self, campaign_id: i64) -> Result<Option<CampaignTotals>, DonationApiError> {
        let mut conn = self.pool.acquire().await?;
        campaigns::fetch_campaign(campaign_id, &mut conn).await
    }

    async fn fetch_event_entry(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEventEntry>, DonationApiError> {
        let mut conn = self.pool.acquire().await?;
        payment_events::fetch_event(provider, provider_payment_id, &mut conn).await
    }

    async fn fetch_pending_donations(
        &self,
        provider: PaymentProvider,
        older_than: Duration,
    ) -> Result<Vec<Donation>, DonationApiError> {
        let mut conn = self.pool.acquire().await?;
        let cutoff = Utc::now() - older_than;
        donations::fetch_pending_donations(provider, cutoff, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
