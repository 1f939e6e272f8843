use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DonationId, EventStatus, PaymentEvent, PaymentEventEntry, PaymentProvider},
    traits::{DonationApiError, LedgerError},
};

pub async fn fetch_event(
    provider: PaymentProvider,
    provider_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentEventEntry>, DonationApiError> {
    let entry = sqlx::query_as(r#"SELECT * FROM payment_events WHERE provider = $1 AND provider_payment_id = $2"#)
        .bind(provider.to_string())
        .bind(provider_payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

/// Records an event in the log. Returns `false` if an entry for the same
/// `(provider, provider_payment_id)` pair already exists, in which case nothing is written.
///
/// `status` and `donation_id` are passed separately from the event because the caller decides what
/// the log should say: orphan events are stored without a donation reference, and events arriving
/// for an already-completed donation are always logged as completed.
pub async fn idempotent_insert(
    event: &PaymentEvent,
    status: EventStatus,
    donation_id: Option<&DonationId>,
    conn: &mut SqliteConnection,
) -> Result<bool, LedgerError> {
    let metadata = event.metadata.to_string();
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            INSERT INTO payment_events (provider, provider_payment_id, status, donation_id, amount, currency,
                metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (provider, provider_payment_id) DO NOTHING;
        "#,
    )
    .bind(event.provider.to_string())
    .bind(&event.provider_payment_id)
    .bind(status.to_string())
    .bind(donation_id.map(|id| id.as_str().to_string()))
    .bind(event.amount)
    .bind(&event.currency)
    .bind(metadata)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Upgrades a `Failed` log entry to `Completed`. Returns `false` when the entry is not currently
/// `Failed`, which means another delivery got there first.
pub async fn upgrade_to_completed(
    provider: PaymentProvider,
    provider_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
            UPDATE payment_events SET status = 'Completed', updated_at = CURRENT_TIMESTAMP
            WHERE provider = $1 AND provider_payment_id = $2 AND status = 'Failed';
        "#,
    )
    .bind(provider.to_string())
    .bind(provider_payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
