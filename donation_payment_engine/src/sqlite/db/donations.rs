use chrono::{DateTime, Utc};
use dpg_common::Cents;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Donation, DonationId, NewDonation, PaymentEvent, PaymentProvider},
    traits::{DonationApiError, LedgerError},
};

/// Inserts a new donation in `Pending` status. The donation id is generated here, and the
/// provider-of-record is derived from the payment method.
pub async fn insert_donation(donation: NewDonation, conn: &mut SqliteConnection) -> Result<Donation, LedgerError> {
    let id = DonationId::random();
    let provider = donation.method.default_provider().map(|p| p.to_string());
    let now = Utc::now();
    let donation = sqlx::query_as(
        r#"
            INSERT INTO donations (id, campaign_id, donor_id, amount, tip_amount, status, provider, method,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'Pending', $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(donation.campaign_id)
    .bind(donation.donor_id)
    .bind(donation.amount)
    .bind(donation.tip_amount)
    .bind(provider)
    .bind(donation.method.to_string())
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(donation)
}

pub async fn fetch_donation(id: &DonationId, conn: &mut SqliteConnection) -> Result<Option<Donation>, DonationApiError> {
    let donation =
        sqlx::query_as(r#"SELECT * FROM donations WHERE id = $1"#).bind(id.as_str()).fetch_optional(conn).await?;
    Ok(donation)
}

pub async fn fetch_donation_by_provider_payment_id(
    provider: PaymentProvider,
    provider_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, DonationApiError> {
    let donation = sqlx::query_as(r#"SELECT * FROM donations WHERE provider = $1 AND provider_payment_id = $2"#)
        .bind(provider.to_string())
        .bind(provider_payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(donation)
}

/// Marks a donation as completed and fills in the correlation data the event carries. Fields that
/// were already populated (payer details, session id, the QR charge alias) are left as they are,
/// so the first writer wins.
///
/// `tip` and `total` are passed in resolved form because their precedence rules need the current
/// donation row, which the caller has already fetched inside the same transaction.
pub async fn mark_completed(
    id: &DonationId,
    event: &PaymentEvent,
    tip: Option<Cents>,
    total: Cents,
    conn: &mut SqliteConnection,
) -> Result<Donation, LedgerError> {
    let payer = event.payer.clone().unwrap_or_default();
    let donation = sqlx::query_as(
        r#"
            UPDATE donations SET
                status = 'Completed',
                provider = $2,
                provider_payment_id = COALESCE(provider_payment_id, $3),
                tip_amount = $4,
                total_amount = $5,
                session_id = COALESCE(session_id, $6),
                payer_name = COALESCE(payer_name, $7),
                payer_account = COALESCE(payer_account, $8),
                payer_document = COALESCE(payer_document, $9),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(event.provider.to_string())
    .bind(&event.provider_payment_id)
    .bind(tip)
    .bind(total)
    .bind(event.session_id.as_deref())
    .bind(payer.name)
    .bind(payer.account)
    .bind(payer.document)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;
    Ok(donation)
}

pub async fn mark_failed(
    id: &DonationId,
    provider: PaymentProvider,
    provider_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Donation, LedgerError> {
    let donation = sqlx::query_as(
        r#"
            UPDATE donations SET
                status = 'Failed',
                provider = $2,
                provider_payment_id = COALESCE(provider_payment_id, $3),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(provider.to_string())
    .bind(provider_payment_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;
    Ok(donation)
}

/// Cancels a donation if it is still in a cancellable state. Returns `None` when the donation has
/// already reached a terminal state (or does not exist), so the caller can decide what that means.
pub async fn mark_cancelled(id: &DonationId, conn: &mut SqliteConnection) -> Result<Option<Donation>, LedgerError> {
    let donation = sqlx::query_as(
        r#"
            UPDATE donations SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('Pending', 'Failed')
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(donation)
}

/// Stores which provider-side object this donation corresponds to. Only pending donations are
/// touched; `None` is returned when the donation has already moved on.
pub async fn attach_provider_correlation(
    id: &DonationId,
    provider: PaymentProvider,
    provider_payment_id: Option<&str>,
    session_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, LedgerError> {
    let donation = sqlx::query_as(
        r#"
            UPDATE donations SET
                provider = $2,
                provider_payment_id = COALESCE($3, provider_payment_id),
                session_id = COALESCE($4, session_id),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(provider.to_string())
    .bind(provider_payment_id)
    .bind(session_id)
    .fetch_optional(conn)
    .await?;
    Ok(donation)
}

pub async fn fetch_pending_donations(
    provider: PaymentProvider,
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Donation>, DonationApiError> {
    let donations = sqlx::query_as(
        r#"
            SELECT * FROM donations
            WHERE status = 'Pending' AND provider = $1 AND provider_payment_id IS NOT NULL AND created_at <= $2
            ORDER BY created_at ASC;
        "#,
    )
    .bind(provider.to_string())
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(donations)
}
