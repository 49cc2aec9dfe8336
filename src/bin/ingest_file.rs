use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use indicator_tracker::adapter::SourceAdapter;
use indicator_tracker::config::Config;
use indicator_tracker::core::ingest::IngestionCoordinator;
use indicator_tracker::core::seeder;
use indicator_tracker::db;
use indicator_tracker::models::{ItemStatus, NormalizedReading};

/// Adapter over a JSON file holding an array of normalized readings. Stands
/// in for the network collectors in local runs.
struct FileAdapter {
    path: PathBuf,
}

#[async_trait]
impl SourceAdapter for FileAdapter {
    fn name(&self) -> &str {
        "file"
    }

    async fn collect(&self) -> Result<Vec<NormalizedReading>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {:?}", self.path))?;
        let readings: Vec<NormalizedReading> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {:?}", self.path))?;
        Ok(readings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let batch_path = std::env::args()
        .nth(1)
        .context("usage: ingest_file <batch.json>")?;

    let config = Config::from_env();
    let pool = db::init(&config.database_path).await?;

    // Make sure the well-known series exist before the batch lands
    seeder::seed_catalog(&pool).await?;

    let adapter = FileAdapter {
        path: PathBuf::from(batch_path),
    };
    let readings = adapter.collect().await?;
    println!("Ingesting {} readings via '{}' adapter", readings.len(), adapter.name());

    let coordinator = IngestionCoordinator::new(pool);
    let report = coordinator.ingest_batch(&readings).await;

    println!("\n{:<25} | {:<18} | {}", "Name", "Status", "Reason");
    println!("{}", "-".repeat(70));
    for item in &report.items {
        let status = match item.status {
            ItemStatus::Saved => "saved",
            ItemStatus::SkippedDuplicate => "skipped-duplicate",
            ItemStatus::Failed => "failed",
        };
        println!(
            "{:<25} | {:<18} | {}",
            item.name,
            status,
            item.reason.as_deref().unwrap_or("-")
        );
    }

    println!(
        "\nSaved: {} | Skipped: {} | Failed: {} | Total: {}",
        report.saved,
        report.skipped_duplicate,
        report.failed,
        report.total()
    );

    Ok(())
}
