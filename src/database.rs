/// SQLite connection setup
///
/// One database file per deployment: `{data_dir}/centerdesk.db`. WAL mode lets
/// readers proceed while a conversion holds the write lock, and the busy
/// timeout bounds how long a second writer waits for it.

use crate::config::DatabaseConfig;
use crate::crm::CrmStorage;
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

/// File name of the CRM database inside the data directory
pub const DATABASE_FILE: &str = "centerdesk.db";

/// Open (creating if needed) the database and make sure the schema exists
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory '{}': {}", config.data_dir, e))?;
    let db_path = Path::new(&config.data_dir).join(DATABASE_FILE);

    tracing::info!("🗄️ Opening database: {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    CrmStorage::new(pool.clone()).init_schema().await?;

    tracing::info!("✅ Database ready: {}", db_path.display());

    Ok(pool)
}
