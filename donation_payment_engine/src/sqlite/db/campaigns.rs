use chrono::Utc;
use dpg_common::Cents;
use sqlx::SqliteConnection;

use crate::{
    db_types::CampaignTotals,
    traits::{DonationApiError, LedgerError},
};

const TOTALS_COLUMNS: &str = "id, goal_amount, collected_amount, donor_count, percentage_funded";

pub async fn fetch_campaign(
    campaign_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CampaignTotals>, DonationApiError> {
    let totals = sqlx::query_as(&format!("SELECT {TOTALS_COLUMNS} FROM campaigns WHERE id = $1"))
        .bind(campaign_id)
        .fetch_optional(conn)
        .await?;
    Ok(totals)
}

/// Rolls a completed donation's base amount up into its campaign.
///
/// Column references on the right-hand side of the SET clauses see the pre-update values, so the
/// percentage is computed from the same new collected total that is being stored.
pub async fn apply_completed_donation(
    campaign_id: i64,
    amount: Cents,
    conn: &mut SqliteConnection,
) -> Result<CampaignTotals, LedgerError> {
    let totals = sqlx::query_as(&format!(
        r#"
            UPDATE campaigns SET
                collected_amount = collected_amount + $2,
                donor_count = donor_count + 1,
                percentage_funded = CASE
                    WHEN goal_amount > 0 THEN ROUND((collected_amount + $2) * 100.0 / goal_amount, 2)
                    ELSE 0.0
                END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {TOTALS_COLUMNS};
        "#
    ))
    .bind(campaign_id)
    .bind(amount)
    .fetch_optional(conn)
    .await?
    .ok_or(LedgerError::CampaignNotFound(campaign_id))?;
    Ok(totals)
}

/// Creates a campaign row. The gateway never does this in production (campaign CRUD belongs to the
/// main application, which shares the database); it exists for seeding test fixtures.
pub async fn insert_campaign(
    title: &str,
    goal_amount: Cents,
    conn: &mut SqliteConnection,
) -> Result<CampaignTotals, LedgerError> {
    let now = Utc::now();
    let totals = sqlx::query_as(&format!(
        r#"
            INSERT INTO campaigns (title, goal_amount, created_at, updated_at) VALUES ($1, $2, $3, $4)
            RETURNING {TOTALS_COLUMNS};
        "#
    ))
    .bind(title)
    .bind(goal_amount)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(totals)
}
