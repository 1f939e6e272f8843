//! Fire-and-forget event hooks raised by the reconciliation engine.
//!
//! Subscribers (the server's notification dispatch, test probes) register async closures in
//! [`EventHooks`]; the engine publishes through [`EventProducers`] after a ledger transaction has
//! committed, so a slow or failing subscriber can never unwind a reconciliation.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
