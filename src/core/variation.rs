use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::error::VariationError;
use crate::models::Reading;

/// Percentage change against the immediately preceding reading of the same
/// indicator.
///
/// None when the subject is the first reading of its series. A previous value
/// of zero is `DivisionUndefined`; read-side callers surface that as
/// "variation unavailable", not as a hard error.
pub async fn variation_percent(
    pool: &SqlitePool,
    reading: &Reading,
) -> Result<Option<Decimal>, VariationError> {
    let row = sqlx::query(
        "SELECT value FROM readings
         WHERE indicator_id = $1 AND collected_at < $2
         ORDER BY collected_at DESC
         LIMIT 1",
    )
    .bind(reading.indicator_id)
    .bind(reading.collected_at)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let previous_str: String = row.try_get("value")?;
    let previous = Decimal::from_str(&previous_str)
        .map_err(|e| VariationError::InvalidValue(format!("stored value '{previous_str}': {e}")))?;

    percent_change(reading.value, previous).map(Some)
}

/// Rounded to 2 decimal places, half-to-even.
pub(crate) fn percent_change(
    subject: Decimal,
    previous: Decimal,
) -> Result<Decimal, VariationError> {
    if previous.is_zero() {
        return Err(VariationError::DivisionUndefined);
    }

    let change = (subject - previous) / previous * Decimal::ONE_HUNDRED;
    Ok(change.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}
