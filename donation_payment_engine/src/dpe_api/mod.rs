//! # Donation payment engine public API
//!
//! The `dpe_api` module exposes the programmatic API for the donation payment engine.
//!
//! * [`reconcile_api`] is the single entry point for payment events. Webhook handlers and the status poller both
//!   feed normalized events through it.
//! * [`donation_api`] provides the donor-facing flows (opening and cancelling donations) and queries over
//!   donations, campaign totals and the event log.
//!
//! # API usage
//!
//! The pattern for both APIs is the same. An API instance is created by supplying a database backend that
//! implements the backend traits required by the API.
//!
//! For example, to query a campaign's fundraising totals:
//!
//! ```rust,ignore
//! use donation_payment_engine::{DonationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements DonationManagement
//! let api = DonationApi::new(db);
//! let totals = api.campaign_totals(42).await?;
//! ```

pub mod donation_api;
pub mod reconcile_api;
