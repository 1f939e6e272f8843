//! Donation Payment Engine
//!
//! The Donation Payment Engine is the ledger core of the donation gateway. It ingests payment events from external
//! payment providers (card checkout sessions and bank QR charges), applies each event to the donation ledger exactly
//! once, and keeps campaign fundraising totals consistent with the set of completed donations.
//!
//! The library is divided into two main sections:
//! 1. Database management and control. SQLite is the supported backend. You should never need to access the database
//!    directly. Instead, use the public API provided by the engine. The exception is the data types used in the
//!    database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`ReconciliationApi`] and [`DonationApi`]). Webhook handlers and the status poller feed
//!    normalized payment events through [`ReconciliationApi::reconcile`]; donor-facing flows (create, cancel, query)
//!    go through [`DonationApi`]. Specific backends need to implement the traits in the [`traits`] module in order to
//!    act as a backend for the donation payment server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when a donation
//! reaches a final state, e.g. a `DonationCompletedEvent` is emitted when a donation is reconciled as completed.
//! A simple actor framework is used so that you can easily hook into these events and perform custom actions.
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
mod dpe_api;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use dpe_api::{donation_api::DonationApi, reconcile_api::ReconciliationApi};
pub use traits::{DonationApiError, DonationManagement, LedgerDatabase, LedgerError};
