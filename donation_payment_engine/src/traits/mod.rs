//! # Database management and control.
//!
//! This module provides the interfaces that define the contracts of the donation ledger *backends*.
//!
//! ## The ledger
//! The ledger associates donations with campaigns, and payment events with donations. Every event that a provider
//! delivers (or that the poller observes) ends up in the event log exactly once, and completed donations roll up into
//! their campaign's fundraising totals.
//!
//! ## Traits
//! * [`LedgerDatabase`] defines the highest level of behaviour for backends supporting the donation payment engine:
//!   applying payment events, opening donations and cancelling them.
//! * [`DonationManagement`] provides methods for querying donations, campaign totals and the event log.
mod donation_management;
mod ledger_database;

pub use donation_management::{DonationApiError, DonationManagement};
pub use ledger_database::{LedgerDatabase, LedgerError};
