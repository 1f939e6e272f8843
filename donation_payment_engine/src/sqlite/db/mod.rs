//! Low-level query functions for the SQLite ledger.
//!
//! Everything in here is a plain async function taking `&mut SqliteConnection` rather than a
//! method on a stateful struct, so the same query code runs inside a pooled connection or inside a
//! transaction without knowing which. Transaction boundaries belong to the callers in
//! [`super::SqliteDatabase`].
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod campaigns;
pub mod donations;
pub mod payment_events;

const SQLITE_DB_URL: &str = "sqlite://data/donations.db";

pub fn db_url() -> String {
    let result = env::var("DPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("DPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
