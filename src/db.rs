use anyhow::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (or create) the database file and bring the schema up.
pub async fn init(database_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = database_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!("connecting to SQLite database at {:?}", database_path);

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    info!("database initialized");
    Ok(pool)
}

/// In-memory database for tests. A single pinned connection, since every
/// SQLite `:memory:` connection is its own database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS indicators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL,
            unit TEXT NOT NULL,
            description TEXT,
            source_hint TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            indicator_id INTEGER NOT NULL REFERENCES indicators(id) ON DELETE CASCADE,
            value TEXT NOT NULL,
            collected_at DATETIME NOT NULL,
            provenance TEXT NOT NULL,
            window_key TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        // One reading per indicator per dedup window. Manual entries carry a
        // NULL window_key and stay outside the constraint.
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_readings_window
         ON readings(indicator_id, window_key) WHERE window_key IS NOT NULL",
        // Primary query pattern: per-series history, newest first
        "CREATE INDEX IF NOT EXISTS idx_readings_series_time
         ON readings(indicator_id, collected_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_indicators_category
         ON indicators(category)",
    ];

    for stmt in indexes {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}
