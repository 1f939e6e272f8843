use chrono::Duration;
use donation_payment_engine::{events::EventProducers, SqliteDatabase};
use log::*;
use provider_tools::QrProviderApi;
use tokio::task::JoinHandle;

use crate::poller::StatusPoller;

/// Starts the background QR sweep worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, the worker lists pending QR donations older than `grace` and polls the provider for each one,
/// settling any whose webhook went missing. The grace period keeps the sweep away from fresh donations that the
/// webhook path is still expected to handle.
pub fn start_sweep_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    qr_api: QrProviderApi,
    interval: Duration,
    grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = interval.to_std().unwrap_or(std::time::Duration::from_secs(120));
        let mut timer = tokio::time::interval(period);
        let poller = StatusPoller::new(db, producers, qr_api);
        info!("🕰️ QR deposit sweep worker started. Sweeping every {} s", period.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running QR deposit sweep");
            match poller.sweep_pending(grace).await {
                Ok(summary) => {
                    if summary.checked == 0 {
                        debug!("🕰️ No pending QR charges old enough to check");
                    } else {
                        info!("🕰️ Sweep complete. {summary}");
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running QR deposit sweep: {e}");
                },
            }
        }
    })
}
