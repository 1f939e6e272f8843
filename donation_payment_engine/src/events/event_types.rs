use crate::db_types::Donation;

/// Emitted when a donation is reconciled as completed. This is the hook to attach receipts,
/// thank-you notifications and similar side effects to.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationCompletedEvent {
    pub donation: Donation,
}

impl DonationCompletedEvent {
    pub fn new(donation: Donation) -> Self {
        Self { donation }
    }
}

/// Emitted when a payment event marks a donation as failed. The failure is not terminal; the
/// provider may still deliver a success later.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationFailedEvent {
    pub donation: Donation,
}

impl DonationFailedEvent {
    pub fn new(donation: Donation) -> Self {
        Self { donation }
    }
}
