//! Support code for integration tests. Only compiled when the `test_utils` feature is enabled.
pub mod prepare_env;

mod helpers;

pub use helpers::seed_campaign;
