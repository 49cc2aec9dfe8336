use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

use indicator_tracker::core::ingest::IngestionCoordinator;
use indicator_tracker::core::registry::IndicatorRegistry;
use indicator_tracker::core::store::{AppendOutcome, ReadingStore};
use indicator_tracker::core::variation::variation_percent;
use indicator_tracker::core::{seeder, views};
use indicator_tracker::db;
use indicator_tracker::error::{CoreError, VariationError};
use indicator_tracker::models::{
    Category, Frequency, IndicatorSpec, ItemStatus, NormalizedReading, Provenance,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn payload(name: &str, value: &str) -> NormalizedReading {
    NormalizedReading {
        name: name.to_string(),
        category: "currency".to_string(),
        unit: "R$".to_string(),
        value: Some(value.to_string()),
        provenance: Provenance::AutomatedApi,
        frequency: Frequency::Daily,
        description: None,
        source_hint: None,
    }
}

fn spec(name: &str) -> IndicatorSpec {
    IndicatorSpec {
        name: name.to_string(),
        category: Category::Currency,
        unit: "R$".to_string(),
        description: None,
        source_hint: None,
    }
}

/// Append two readings a moment apart so collected_at strictly increases.
async fn append_pair(store: &ReadingStore, indicator_id: i64, first: &str, second: &str) {
    store
        .append(indicator_id, dec(first), Provenance::ManualEntry, None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    store
        .append(indicator_id, dec(second), Provenance::ManualEntry, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn resolve_or_create_is_unique_and_first_write_wins() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool);

    let (first, created) = registry.resolve_or_create(&spec("Dólar")).await.unwrap();
    assert!(created);

    // Second resolution with different metadata: same row, nothing updated
    let divergent = IndicatorSpec {
        category: Category::Other,
        unit: "US$".to_string(),
        ..spec("Dólar")
    };
    let (second, created) = registry.resolve_or_create(&divergent).await.unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.category, Category::Currency);
    assert_eq!(second.unit, "R$");

    assert_eq!(registry.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_day_reingest_is_skipped() {
    let pool = db::init_in_memory().await.unwrap();
    let coordinator = IngestionCoordinator::new(pool.clone());

    let batch = vec![payload("Dólar", "5.10")];

    let report = coordinator.ingest_batch(&batch).await;
    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped_duplicate, 0);

    let report = coordinator.ingest_batch(&batch).await;
    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.items[0].status, ItemStatus::SkippedDuplicate);

    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool);
    let indicator = registry.get_by_name("Dólar").await.unwrap().unwrap();
    assert_eq!(store.count(indicator.id).await.unwrap(), 1);
}

#[tokio::test]
async fn bad_item_does_not_abort_the_batch() {
    let pool = db::init_in_memory().await.unwrap();
    let coordinator = IngestionCoordinator::new(pool.clone());

    let batch = vec![payload("Dólar", "5.10"), payload("Dólar", "bad")];
    let report = coordinator.ingest_batch(&batch).await;

    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped_duplicate, 0);
    assert_eq!(report.total(), 2);
    assert!(report.items[1].reason.is_some());

    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool);
    let indicator = registry.get_by_name("Dólar").await.unwrap().unwrap();
    let readings = store.list(indicator.id, None).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value, dec("5.10"));
}

#[tokio::test]
async fn missing_value_and_unknown_category_fail_per_item() {
    let pool = db::init_in_memory().await.unwrap();
    let coordinator = IngestionCoordinator::new(pool);

    let mut no_value = payload("Euro", "1");
    no_value.value = None;
    let mut bad_category = payload("Bitcoin", "250000");
    bad_category.category = "crypto".to_string();

    let report = coordinator.ingest_batch(&[no_value, bad_category]).await;
    assert_eq!(report.failed, 2);
    assert_eq!(report.saved, 0);
}

#[tokio::test]
async fn monthly_window_dedups_within_the_month() {
    let pool = db::init_in_memory().await.unwrap();
    let coordinator = IngestionCoordinator::new(pool);

    let mut ipca = payload("IPCA", "0.44");
    ipca.category = "index".to_string();
    ipca.unit = "%".to_string();
    ipca.provenance = Provenance::Scraped;
    ipca.frequency = Frequency::Monthly;

    let report = coordinator.ingest_batch(std::slice::from_ref(&ipca)).await;
    assert_eq!(report.saved, 1);

    let report = coordinator.ingest_batch(&[ipca]).await;
    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped_duplicate, 1);
}

#[tokio::test]
async fn manual_entries_bypass_the_dedup_window() {
    let pool = db::init_in_memory().await.unwrap();
    let coordinator = IngestionCoordinator::new(pool.clone());

    let mut entry = payload("Cesta Básica", "780.50");
    entry.provenance = Provenance::ManualEntry;

    let report = coordinator.ingest_batch(std::slice::from_ref(&entry)).await;
    assert_eq!(report.saved, 1);

    entry.value = Some("781.00".to_string());
    let report = coordinator.ingest_batch(&[entry]).await;
    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped_duplicate, 0);

    let registry = IndicatorRegistry::new(pool.clone());
    let indicator = registry.get_by_name("Cesta Básica").await.unwrap().unwrap();
    assert_eq!(ReadingStore::new(pool).count(indicator.id).await.unwrap(), 2);
}

#[tokio::test]
async fn variation_of_first_reading_is_none() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let (indicator, _) = registry.resolve_or_create(&spec("Euro")).await.unwrap();
    let outcome = store
        .append(indicator.id, dec("6.15"), Provenance::ManualEntry, None)
        .await
        .unwrap();
    let AppendOutcome::Inserted(reading) = outcome else {
        panic!("append should insert");
    };

    assert_eq!(variation_percent(&pool, &reading).await.unwrap(), None);
}

#[tokio::test]
async fn variation_between_sequential_readings() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let (indicator, _) = registry.resolve_or_create(&spec("Dólar")).await.unwrap();
    append_pair(&store, indicator.id, "5.0000", "5.2500").await;

    let latest = store.latest(indicator.id).await.unwrap().unwrap();
    assert_eq!(latest.value, dec("5.2500"));

    let variation = variation_percent(&pool, &latest).await.unwrap();
    assert_eq!(variation, Some(dec("5.00")));
}

#[tokio::test]
async fn zero_previous_value_is_unavailable_not_an_error() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let (indicator, _) = registry.resolve_or_create(&spec("Peso Argentino")).await.unwrap();
    append_pair(&store, indicator.id, "0", "0.0051").await;

    let latest = store.latest(indicator.id).await.unwrap().unwrap();

    // The engine reports the condition...
    let err = variation_percent(&pool, &latest).await.unwrap_err();
    assert!(matches!(err, VariationError::DivisionUndefined));

    // ...and the read side folds it to "unavailable"
    assert_eq!(views::variation_of(&pool, &latest).await.unwrap(), None);
}

#[tokio::test]
async fn list_is_descending_and_bounded() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let (indicator, _) = registry.resolve_or_create(&spec("Dólar")).await.unwrap();
    for value in ["5.00", "5.10", "5.20"] {
        store
            .append(indicator.id, dec(value), Provenance::ManualEntry, None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let all = store.list(indicator.id, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].value, dec("5.20"));
    assert_eq!(all[2].value, dec("5.00"));

    let bounded = store.list(indicator.id, Some(2)).await.unwrap();
    assert_eq!(bounded.len(), 2);
    assert_eq!(bounded[0].value, dec("5.20"));
}

#[tokio::test]
async fn compare_returns_partial_results_and_not_found_when_empty() {
    let pool = db::init_in_memory().await.unwrap();
    let coordinator = IngestionCoordinator::new(pool.clone());

    let report = coordinator.ingest_batch(&[payload("Dólar", "5.10")]).await;
    assert_eq!(report.saved, 1);

    let registry = IndicatorRegistry::new(pool.clone());
    let indicator = registry.get_by_name("Dólar").await.unwrap().unwrap();

    // One id resolves, the other does not: partial result, no error
    let histories = views::compare(&pool, &[indicator.id, indicator.id + 999], 10)
        .await
        .unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].indicator.name, "Dólar");
    assert_eq!(histories[0].readings.len(), 1);

    // No id resolves: explicit not-found
    let err = views::compare(&pool, &[9998, 9999], 10).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn dashboard_reports_latest_and_variation() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let (dolar, _) = registry.resolve_or_create(&spec("Dólar")).await.unwrap();
    append_pair(&store, dolar.id, "5.0000", "5.2500").await;
    registry.resolve_or_create(&spec("Euro")).await.unwrap();

    let overview = views::dashboard(&pool).await.unwrap();
    assert_eq!(overview.len(), 2);

    let dolar_row = overview
        .iter()
        .find(|o| o.indicator.name == "Dólar")
        .unwrap();
    assert_eq!(dolar_row.latest.as_ref().unwrap().value, dec("5.2500"));
    assert_eq!(dolar_row.variation, Some(dec("5.00")));

    // No readings yet: nulls, no error
    let euro_row = overview.iter().find(|o| o.indicator.name == "Euro").unwrap();
    assert!(euro_row.latest.is_none());
    assert!(euro_row.variation.is_none());
}

#[tokio::test]
async fn deleting_an_indicator_cascades_to_readings() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool.clone());
    let store = ReadingStore::new(pool.clone());

    let (indicator, _) = registry.resolve_or_create(&spec("Dólar")).await.unwrap();
    append_pair(&store, indicator.id, "5.00", "5.10").await;
    assert_eq!(store.count(indicator.id).await.unwrap(), 2);

    registry.delete(indicator.id).await.unwrap();

    assert!(matches!(
        registry.get(indicator.id).await.unwrap_err(),
        CoreError::NotFound(_)
    ));
    assert_eq!(store.count(indicator.id).await.unwrap(), 0);

    // Deleting again is a not-found, not a silent no-op
    assert!(matches!(
        registry.delete(indicator.id).await.unwrap_err(),
        CoreError::NotFound(_)
    ));
}

#[tokio::test]
async fn admin_update_advances_updated_at() {
    let pool = db::init_in_memory().await.unwrap();
    let registry = IndicatorRegistry::new(pool);

    let (indicator, _) = registry.resolve_or_create(&spec("Dólar")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let corrected = IndicatorSpec {
        description: Some("Cotação PTAX de venda".to_string()),
        ..spec("Dólar")
    };
    let updated = registry.update_metadata(indicator.id, &corrected).await.unwrap();

    assert_eq!(updated.description.as_deref(), Some("Cotação PTAX de venda"));
    assert!(updated.updated_at > indicator.updated_at);
    assert_eq!(updated.created_at, indicator.created_at);
}

#[tokio::test]
async fn seeding_the_catalog_is_idempotent() {
    let pool = db::init_in_memory().await.unwrap();

    let created = seeder::seed_catalog(&pool).await.unwrap();
    assert!(created > 0);

    let again = seeder::seed_catalog(&pool).await.unwrap();
    assert_eq!(again, 0);

    let stats = views::category_stats(&pool).await.unwrap();
    let currencies = stats
        .iter()
        .find(|s| s.category == Category::Currency)
        .unwrap();
    assert!(currencies.count >= 4);
}
