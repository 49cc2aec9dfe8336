use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::core::registry::IndicatorRegistry;
use crate::core::store::ReadingStore;
use crate::core::variation::variation_percent;
use crate::error::{CoreError, VariationError};
use crate::models::{CategoryCount, IndicatorHistory, IndicatorOverview, Reading};

/// Fold the variation outcome for read-side callers: an undefined division
/// is "unavailable", not an error.
fn fold_variation(
    result: Result<Option<Decimal>, VariationError>,
) -> Result<Option<Decimal>, CoreError> {
    match result {
        Ok(v) => Ok(v),
        Err(VariationError::DivisionUndefined) => Ok(None),
        Err(VariationError::InvalidValue(msg)) => Err(CoreError::InvalidValue(msg)),
        Err(VariationError::Database(e)) => Err(CoreError::Database(e)),
    }
}

/// Dashboard view: every indicator with its latest reading and that
/// reading's variation against its predecessor.
pub async fn dashboard(pool: &SqlitePool) -> Result<Vec<IndicatorOverview>, CoreError> {
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let mut overview = Vec::new();
    for indicator in registry.list().await? {
        let latest = store.latest(indicator.id).await?;
        let variation = match &latest {
            Some(reading) => fold_variation(variation_percent(pool, reading).await)?,
            None => None,
        };
        overview.push(IndicatorOverview {
            indicator,
            latest,
            variation,
        });
    }
    Ok(overview)
}

/// Variation of a single reading, with DivisionUndefined folded to None.
pub async fn variation_of(
    pool: &SqlitePool,
    reading: &Reading,
) -> Result<Option<Decimal>, CoreError> {
    fold_variation(variation_percent(pool, reading).await)
}

/// Comparison view: bounded histories for the requested indicator ids.
///
/// Ids that do not resolve are silently omitted; the call fails with
/// NotFound only when none of them resolve.
pub async fn compare(
    pool: &SqlitePool,
    ids: &[i64],
    limit: u32,
) -> Result<Vec<IndicatorHistory>, CoreError> {
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let found = registry.resolve_many(ids).await?;
    if found.is_empty() {
        return Err(CoreError::NotFound(
            "none of the requested indicators exist".to_string(),
        ));
    }

    let mut histories = Vec::with_capacity(found.len());
    for indicator in found {
        let readings = store.list(indicator.id, Some(limit)).await?;
        histories.push(IndicatorHistory {
            indicator,
            readings,
        });
    }
    Ok(histories)
}

/// Statistics view: indicator counts per category.
pub async fn category_stats(pool: &SqlitePool) -> Result<Vec<CategoryCount>, CoreError> {
    IndicatorRegistry::new(pool.clone()).counts_by_category().await
}
