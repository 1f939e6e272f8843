//! # Donation payment server
//! This module hosts the HTTP surface of the donation payment gateway. It is responsible for:
//! Listening for incoming webhook deliveries from the card gateway and the bank QR provider.
//! Verifying webhook signatures against the raw request bytes before anything is parsed.
//! Normalizing provider payloads into payment events and feeding them to the reconciliation engine.
//! Serving donation initiation, status, cancellation and campaign total requests.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/card/payment`, `/webhook/qr/payment`: signed webhook routes, one scope per provider
//!   so that each gets its own secret.
//! * `/qr/{alias}/status`: the active reconciliation path — polls the QR provider and runs the
//!   result through the same reconciliation engine as the webhooks.
//! * `/donations`, `/donations/{id}`, `/donations/{id}/cancel`, `/campaigns/{id}/totals`.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod poller;
pub mod routes;
pub mod server;
pub mod sweep_worker;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
