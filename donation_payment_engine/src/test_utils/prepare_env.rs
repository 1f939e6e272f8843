use std::{env, path::Path};

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Creates a fresh, fully migrated throwaway database at `url`. Call once at the top of each
/// integration test.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    create_database(url).await;
    run_migrations(url).await;
    debug!("🚀️ Test database ready at {url}");
}

/// A unique sqlite url in the system temp directory, so parallel test binaries never share state.
pub fn random_db_url() -> String {
    format!("sqlite://{}/dpg_test_{}.db", env::temp_dir().display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to the new database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running the schema migrations");
    info!("🚀️ Migrations complete");
}

/// Drops any stale database at `path` and creates an empty one.
pub async fn create_database<P: AsRef<Path>>(path: P) {
    let path = path.as_ref().as_os_str().to_str().expect("Database path is not valid UTF-8");
    if let Err(e) = Sqlite::drop_database(path).await {
        trace!("No stale database to drop at {path} ({e})");
    }
    Sqlite::create_database(path).await.expect("Error creating the test database");
    debug!("🚀️ Created Sqlite database {path}");
}
