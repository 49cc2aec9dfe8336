use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::{Provenance, Reading};

/// Result of a conditional append.
#[derive(Debug)]
pub enum AppendOutcome {
    Inserted(Reading),
    /// The dedup window is already occupied for this indicator.
    DuplicateWindow,
}

/// Append-only store for readings. Never mutates or removes rows; deletion
/// happens only through the owning indicator's cascade.
#[derive(Clone)]
pub struct ReadingStore {
    pool: SqlitePool,
}

pub(crate) fn reading_from_row(row: &SqliteRow) -> Result<Reading, CoreError> {
    let value_str: String = row.try_get("value")?;
    let value = Decimal::from_str(&value_str)
        .map_err(|e| CoreError::InvalidValue(format!("stored value '{value_str}': {e}")))?;

    let provenance_str: String = row.try_get("provenance")?;
    let provenance = Provenance::parse(&provenance_str)
        .ok_or_else(|| CoreError::InvalidValue(format!("stored provenance '{provenance_str}'")))?;

    Ok(Reading {
        id: row.try_get("id")?,
        indicator_id: row.try_get("indicator_id")?,
        value,
        collected_at: row.try_get("collected_at")?,
        provenance,
        window_key: row.try_get("window_key")?,
    })
}

impl ReadingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a reading stamped with the current time.
    ///
    /// The insert is conditional on the dedup window: when `window_key` is
    /// already taken for this indicator the statement is a no-op and
    /// `DuplicateWindow` comes back, so check-and-append is a single atomic
    /// operation even under concurrent writers.
    pub async fn append(
        &self,
        indicator_id: i64,
        value: Decimal,
        provenance: Provenance,
        window_key: Option<&str>,
    ) -> Result<AppendOutcome, CoreError> {
        let now = Utc::now();

        let row = sqlx::query(
            "INSERT INTO readings (indicator_id, value, collected_at, provenance, window_key)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT DO NOTHING
             RETURNING id",
        )
        .bind(indicator_id)
        .bind(value.to_string())
        .bind(now)
        .bind(provenance.as_str())
        .bind(window_key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(AppendOutcome::Inserted(Reading {
                id: row.try_get("id")?,
                indicator_id,
                value,
                collected_at: now,
                provenance,
                window_key: window_key.map(str::to_string),
            })),
            None => Ok(AppendOutcome::DuplicateWindow),
        }
    }

    /// Most recent reading for the indicator, if any.
    pub async fn latest(&self, indicator_id: i64) -> Result<Option<Reading>, CoreError> {
        let row = sqlx::query(
            "SELECT id, indicator_id, value, collected_at, provenance, window_key
             FROM readings
             WHERE indicator_id = $1
             ORDER BY collected_at DESC
             LIMIT 1",
        )
        .bind(indicator_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(reading_from_row).transpose()
    }

    /// History for the indicator, newest first. `limit` bounds the result
    /// size; None returns everything.
    pub async fn list(
        &self,
        indicator_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<Reading>, CoreError> {
        let rows = sqlx::query(
            "SELECT id, indicator_id, value, collected_at, provenance, window_key
             FROM readings
             WHERE indicator_id = $1
             ORDER BY collected_at DESC
             LIMIT $2",
        )
        .bind(indicator_id)
        .bind(limit.map(i64::from).unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reading_from_row).collect()
    }

    pub async fn count(&self, indicator_id: i64) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM readings WHERE indicator_id = $1")
            .bind(indicator_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("count")?)
    }
}
