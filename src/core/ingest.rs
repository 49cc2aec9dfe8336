use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::registry::IndicatorRegistry;
use crate::core::store::{AppendOutcome, ReadingStore};
use crate::error::CoreError;
use crate::models::{
    Category, Frequency, IndicatorSpec, IngestionReport, ItemStatus, NormalizedReading, Provenance,
};

/// Best-effort batch ingestion over independently-resolvable external data.
///
/// Each item is parsed, resolved against the registry and conditionally
/// appended on its own; one bad item never aborts the batch. Overlapping
/// batch runs serialize on the run lock, and the store's conditional append
/// keeps the dedup invariant even without it.
pub struct IngestionCoordinator {
    registry: IndicatorRegistry,
    store: ReadingStore,
    run_lock: Arc<Mutex<()>>,
}

impl IngestionCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            registry: IndicatorRegistry::new(pool.clone()),
            store: ReadingStore::new(pool),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    /// Ingest a batch of normalized readings and account for every item.
    ///
    /// Always returns a complete report: each input maps to exactly one of
    /// saved / skipped-duplicate / failed. Re-running the same batch within
    /// the same dedup windows is idempotent.
    pub async fn ingest_batch(&self, readings: &[NormalizedReading]) -> IngestionReport {
        let _guard = self.run_lock.lock().await;

        let mut report = IngestionReport::default();

        for item in readings {
            match self.ingest_one(item).await {
                Ok(status) => report.record(&item.name, status, None),
                Err(e) => {
                    warn!(name = %item.name, error = %e, "reading failed");
                    report.record(&item.name, ItemStatus::Failed, Some(e.to_string()));
                }
            }
        }

        info!(
            saved = report.saved,
            skipped_duplicate = report.skipped_duplicate,
            failed = report.failed,
            "ingestion batch complete"
        );

        report
    }

    async fn ingest_one(&self, item: &NormalizedReading) -> Result<ItemStatus, CoreError> {
        // 1. Parse the raw payload fields
        let raw_value = item
            .value
            .as_deref()
            .ok_or_else(|| CoreError::InvalidValue("missing value".to_string()))?;
        let value = Decimal::from_str(raw_value.trim())
            .map_err(|e| CoreError::InvalidValue(format!("'{raw_value}': {e}")))?;

        let category = Category::parse(&item.category)
            .ok_or_else(|| CoreError::InvalidCategory(item.category.clone()))?;

        // 2. Resolve or create the indicator
        let spec = IndicatorSpec {
            name: item.name.clone(),
            category,
            unit: item.unit.clone(),
            description: item.description.clone(),
            source_hint: item.source_hint.clone(),
        };
        let (indicator, was_created) = self.registry.resolve_or_create(&spec).await?;
        if was_created {
            info!(name = %indicator.name, id = indicator.id, "indicator created on ingest");
        }

        // 3. Conditional append within the dedup window
        let key = window_key(item.provenance, item.frequency, Utc::now());
        match self
            .store
            .append(indicator.id, value, item.provenance, key.as_deref())
            .await?
        {
            AppendOutcome::Inserted(_) => Ok(ItemStatus::Saved),
            AppendOutcome::DuplicateWindow => Ok(ItemStatus::SkippedDuplicate),
        }
    }
}

/// Dedup window for a reading collected at `at`.
///
/// Manual entries are exempt. Daily series occupy a calendar day, monthly
/// series a calendar month.
pub(crate) fn window_key(
    provenance: Provenance,
    frequency: Frequency,
    at: DateTime<Utc>,
) -> Option<String> {
    match provenance {
        Provenance::ManualEntry => None,
        Provenance::AutomatedApi | Provenance::Scraped => Some(match frequency {
            Frequency::Daily => at.format("%Y-%m-%d").to_string(),
            Frequency::Monthly => at.format("%Y-%m").to_string(),
        }),
    }
}
