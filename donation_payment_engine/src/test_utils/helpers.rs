use dpg_common::Cents;

use crate::{sqlite::db::campaigns, SqliteDatabase};

/// Seeds a campaign row and returns its id. In production the main application owns campaign
/// creation; tests need a way to stand one up.
pub async fn seed_campaign(db: &SqliteDatabase, title: &str, goal_amount: Cents) -> i64 {
    let mut conn = db.pool().acquire().await.expect("Error acquiring a db connection");
    let totals = campaigns::insert_campaign(title, goal_amount, &mut conn).await.expect("Error seeding a campaign");
    totals.id
}
