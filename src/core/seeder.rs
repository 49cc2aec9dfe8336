use sqlx::SqlitePool;
use tracing::info;

use crate::catalog;
use crate::core::registry::IndicatorRegistry;
use crate::error::CoreError;

/// Seed the registry with the well-known series catalog.
///
/// Runs every template through `resolve_or_create`, so re-seeding is
/// idempotent and never touches existing rows. Returns how many indicators
/// this run created.
pub async fn seed_catalog(pool: &SqlitePool) -> Result<usize, CoreError> {
    let registry = IndicatorRegistry::new(pool.clone());

    let mut created = 0;
    for template in catalog::known_series() {
        let (_, was_created) = registry.resolve_or_create(&template.to_spec()).await?;
        if was_created {
            created += 1;
        }
    }

    info!(
        total = catalog::known_series().len(),
        created, "catalog seeded"
    );
    Ok(created)
}
