use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::models::{Category, CategoryCount, Indicator, IndicatorSpec};

/// Identity and metadata for tracked series, backed by the `indicators`
/// table. Holds its storage handle explicitly so it can run against any pool
/// (file-backed or in-memory).
#[derive(Clone)]
pub struct IndicatorRegistry {
    pool: SqlitePool,
}

pub(crate) fn indicator_from_row(row: &SqliteRow) -> Result<Indicator, CoreError> {
    let category_str: String = row.try_get("category")?;
    let category = Category::parse(&category_str)
        .ok_or_else(|| CoreError::InvalidCategory(category_str.clone()))?;

    Ok(Indicator {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category,
        unit: row.try_get("unit")?,
        description: row.try_get("description")?,
        source_hint: row.try_get("source_hint")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const INDICATOR_COLS: &str =
    "id, name, category, unit, description, source_hint, created_at, updated_at";

impl IndicatorRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up an indicator by exact name, creating it when absent.
    ///
    /// Returns the indicator plus whether this call created it. The insert is
    /// an atomic conditional insert, so two racing resolvers converge on the
    /// same row. Descriptive fields are first-write-wins: metadata supplied
    /// for an existing indicator is discarded, with a warning when it
    /// diverges from what is stored.
    pub async fn resolve_or_create(
        &self,
        spec: &IndicatorSpec,
    ) -> Result<(Indicator, bool), CoreError> {
        let now = Utc::now();

        let inserted = sqlx::query(&format!(
            "INSERT INTO indicators (name, category, unit, description, source_hint, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT(name) DO NOTHING
             RETURNING {INDICATOR_COLS}"
        ))
        .bind(&spec.name)
        .bind(spec.category.as_str())
        .bind(&spec.unit)
        .bind(&spec.description)
        .bind(&spec.source_hint)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            let indicator = indicator_from_row(&row)?;
            debug!(name = %indicator.name, id = indicator.id, "indicator created");
            return Ok((indicator, true));
        }

        // Insert was a no-op, the name already exists.
        let existing = self
            .get_by_name(&spec.name)
            .await?
            .ok_or_else(|| CoreError::NotFound(spec.name.clone()))?;

        if existing.category != spec.category || existing.unit != spec.unit {
            warn!(
                name = %existing.name,
                stored_category = existing.category.as_str(),
                supplied_category = spec.category.as_str(),
                stored_unit = %existing.unit,
                supplied_unit = %spec.unit,
                "metadata divergence on resolve, stored values kept"
            );
        }

        Ok((existing, false))
    }

    pub async fn get(&self, id: i64) -> Result<Indicator, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {INDICATOR_COLS} FROM indicators WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => indicator_from_row(&row),
            None => Err(CoreError::NotFound(format!("indicator id {id}"))),
        }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Indicator>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {INDICATOR_COLS} FROM indicators WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(indicator_from_row).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Indicator>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {INDICATOR_COLS} FROM indicators ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(indicator_from_row).collect()
    }

    /// Resolve a set of ids, returning only the ones that exist.
    pub async fn resolve_many(&self, ids: &[i64]) -> Result<Vec<Indicator>, CoreError> {
        let mut found = Vec::with_capacity(ids.len());
        for &id in ids {
            let row = sqlx::query(&format!(
                "SELECT {INDICATOR_COLS} FROM indicators WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                found.push(indicator_from_row(&row)?);
            }
        }
        Ok(found)
    }

    pub async fn counts_by_category(&self) -> Result<Vec<CategoryCount>, CoreError> {
        let rows = sqlx::query(
            "SELECT category, COUNT(*) as count FROM indicators GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let category_str: String = row.try_get("category")?;
            let category = Category::parse(&category_str)
                .ok_or_else(|| CoreError::InvalidCategory(category_str))?;
            counts.push(CategoryCount {
                category,
                count: row.try_get("count")?,
            });
        }
        Ok(counts)
    }

    /// Administrative metadata correction. Overwrites the descriptive fields
    /// and advances `updated_at`.
    pub async fn update_metadata(
        &self,
        id: i64,
        spec: &IndicatorSpec,
    ) -> Result<Indicator, CoreError> {
        let result = sqlx::query(
            "UPDATE indicators
             SET name = $1, category = $2, unit = $3, description = $4, source_hint = $5, updated_at = $6
             WHERE id = $7",
        )
        .bind(&spec.name)
        .bind(spec.category.as_str())
        .bind(&spec.unit)
        .bind(&spec.description)
        .bind(&spec.source_hint)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("indicator id {id}")));
        }

        self.get(id).await
    }

    /// Administrative deletion. Cascades to all readings of the indicator.
    pub async fn delete(&self, id: i64) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM indicators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("indicator id {id}")));
        }
        Ok(())
    }
}
