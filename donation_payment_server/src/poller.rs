//! Deposit status polling for the bank QR provider.
//!
//! QR webhooks are best-effort at several banks, so the donor-facing app polls
//! `GET /qr/{alias}/status` while it waits, and the background sweep re-checks pending charges on a
//! timer. Both paths land here. A deposit that turns out to be settled is converted into the same
//! [`PaymentEvent`] a webhook would have produced and fed through [`ReconciliationApi::reconcile`],
//! so polling can never apply a payment twice or disagree with the webhook path about what a
//! settlement means.

use std::fmt::Display;

use donation_payment_engine::{
    db_types::{Donation, EventStatus, PayerDetails, PaymentEvent, PaymentProvider, PaymentStatus},
    events::EventProducers,
    traits::LedgerDatabase,
    DonationApi,
    ReconciliationApi,
};
use log::*;
use provider_tools::{DepositStatus, QrDepositState, QrProviderApi};
use serde_json::Value;

use crate::{data_objects::PollData, errors::ServerError};

pub struct StatusPoller<B> {
    recon: ReconciliationApi<B>,
    donations: DonationApi<B>,
    qr: QrProviderApi,
}

impl<B> StatusPoller<B>
where B: LedgerDatabase
{
    pub fn new(db: B, producers: EventProducers, qr: QrProviderApi) -> Self {
        let recon = ReconciliationApi::new(db.clone(), producers);
        let donations = DonationApi::new(db);
        Self { recon, donations, qr }
    }

    /// Reports the deposit status of a QR charge.
    ///
    /// A donation that has already settled locally is answered straight from the ledger, without a
    /// provider call. Otherwise the provider's status API is consulted; a deposit it reports as
    /// settled is applied to the ledger through the reconciliation engine before the status is
    /// returned. Provider errors and unrecognised status vocabulary are reported as
    /// [`ServerError::ProviderUnavailable`] and mutate nothing; a poll failure never marks a
    /// payment as anything.
    pub async fn poll_qr_status(&self, alias: &str) -> Result<PollData, ServerError> {
        let local = self.donations.donation_by_provider_payment_id(PaymentProvider::BankQr, alias).await?;
        if let Some(donation) = &local {
            if donation.status == PaymentStatus::Completed {
                debug!("📡️ QR charge {alias} has already settled locally. Skipping the provider call");
                return Ok(settled_poll_data(donation));
            }
        }
        trace!("📡️ Checking deposit status for QR charge {alias}");
        let deposit = self.qr.deposit_status(alias).await?;
        let state = deposit.state()?;
        debug!("📡️ Provider reports QR charge {alias} as {state:?}");
        if state == QrDepositState::Completed {
            let mut event = PaymentEvent::new(
                PaymentProvider::BankQr,
                alias,
                EventStatus::Completed,
                deposit.amount.unwrap_or_default(),
            )
            .with_metadata(serde_json::to_value(&deposit).unwrap_or(Value::Null));
            if deposit.payer_name.is_some() || deposit.payer_account.is_some() || deposit.payer_document.is_some() {
                event = event.with_payer(PayerDetails {
                    name: deposit.payer_name.clone(),
                    account: deposit.payer_account.clone(),
                    document: deposit.payer_document.clone(),
                });
            }
            if let Some(donation) = local {
                event = event.with_donation(donation.id);
            }
            let outcome = self.recon.reconcile(event).await.map_err(|e| {
                error!("📡️ Polled QR deposit {alias} is settled but could not be applied to the ledger. {e}");
                ServerError::BackendError(e.to_string())
            })?;
            if outcome.is_applied() {
                info!("📡️ QR deposit {alias} was found settled by polling and has been applied to the ledger");
            }
        }
        Ok(poll_data(state, deposit))
    }

    /// Runs one sweep over pending QR donations, polling each charge that is older than the grace
    /// period. Individual poll failures are counted and logged but do not abort the sweep.
    pub async fn sweep_pending(&self, older_than: chrono::Duration) -> Result<SweepSummary, ServerError> {
        let pending = self.donations.pending_donations(PaymentProvider::BankQr, older_than).await?;
        let mut summary = SweepSummary::default();
        for donation in pending {
            let Some(alias) = donation.provider_payment_id.as_deref() else {
                continue;
            };
            summary.checked += 1;
            match self.poll_qr_status(alias).await {
                Ok(data) if data.status == QrDepositState::Completed => summary.settled += 1,
                Ok(_) => {},
                Err(e) => {
                    summary.failures += 1;
                    warn!("🕰️ Could not check the deposit status for donation {} ({alias}). {e}", donation.id);
                },
            }
        }
        Ok(summary)
    }
}

//-------------------------------------------  SweepSummary  ----------------------------------------------------------

/// Tally of one background sweep over pending QR donations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub checked: usize,
    pub settled: usize,
    pub failures: usize,
}

impl Display for SweepSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} pending QR charges checked, {} settled, {} checks failed", self.checked, self.settled, self.failures)
    }
}

fn settled_poll_data(donation: &Donation) -> PollData {
    PollData {
        status: QrDepositState::Completed,
        processed_at: Some(donation.updated_at),
        payer_name: donation.payer_name.clone(),
        payer_account: donation.payer_account.clone(),
        payer_document: donation.payer_document.clone(),
        transaction_id: None,
    }
}

fn poll_data(state: QrDepositState, deposit: DepositStatus) -> PollData {
    PollData {
        status: state,
        processed_at: deposit.processed_at,
        payer_name: deposit.payer_name,
        payer_account: deposit.payer_account,
        payer_document: deposit.payer_document,
        transaction_id: deposit.transaction_id,
    }
}
