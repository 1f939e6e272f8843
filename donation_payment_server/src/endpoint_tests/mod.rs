//! Endpoint tests for the server routes.
//!
//! Read-only routes are tested against a mocked ledger. The webhook, cancellation and polling
//! tests run the full middleware and handler stack over a real throwaway SQLite ledger, since the
//! exactly-once behaviour under test lives in the interplay between the HTTP surface and the
//! engine's transaction.

mod donations;
mod helpers;
mod mocks;
mod qr_status;
mod reads;
mod webhooks;
