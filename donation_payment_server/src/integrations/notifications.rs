//! Bridges ledger events to the notification dispatcher.
//!
//! The reconciliation engine publishes [`DonationCompletedEvent`]s and [`DonationFailedEvent`]s
//! once its transaction has committed. The handlers registered here hand them to the platform's
//! notification service (thank-you mail to the donor, push update to the campaign owner). Delivery
//! is fire-and-forget: the payment has settled whether or not anyone hears about it, so a handler
//! failure is logged and dropped, never propagated back to the payment flow.
//!
//! The notification service itself lives outside this gateway. Until its client is wired in, the
//! handlers record the dispatch in the log, which also gives test environments a visible trace.

use donation_payment_engine::events::{EventHandlers, EventHooks};
use log::*;

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

/// Assigns the notification handlers for ledger events.
pub fn create_notification_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_donation_completed(|ev| {
        let donation = ev.donation;
        Box::pin(async move {
            info!(
                "📬️ Donation {} to campaign {} completed ({}). Dispatching donor and campaign notifications",
                donation.id,
                donation.campaign_id,
                donation.total_amount.unwrap_or(donation.amount)
            );
        })
    });
    hooks.on_donation_failed(|ev| {
        let donation = ev.donation;
        Box::pin(async move {
            debug!(
                "📬️ Donation {} to campaign {} failed. No notification is sent; the provider may yet retry",
                donation.id, donation.campaign_id
            );
        })
    });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}
