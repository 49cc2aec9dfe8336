use anyhow::Result;
use tracing_subscriber::EnvFilter;

use indicator_tracker::config::Config;
use indicator_tracker::core::views;
use indicator_tracker::db;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Config::from_env();
    println!("Connecting to: {:?}", config.database_path);

    if !config.database_path.exists() {
        println!("DB not found, nothing to inspect.");
        return Ok(());
    }

    let pool = db::init(&config.database_path).await?;
    let overview = views::dashboard(&pool).await?;
    let stats = views::category_stats(&pool).await?;

    println!(
        "\n{:<20} | {:<10} | {:<6} | {:<12} | {:<25} | {:<8}",
        "Name", "Category", "Unit", "Latest", "Collected", "Var %"
    );
    println!("{}", "-".repeat(95));

    for row in &overview {
        let (latest, collected) = match &row.latest {
            Some(r) => (r.value.to_string(), r.collected_at.to_rfc3339()),
            None => ("-".to_string(), "NO DATA".to_string()),
        };
        let variation = row
            .variation
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<20} | {:<10} | {:<6} | {:<12} | {:<25} | {:<8}",
            row.indicator.name,
            row.indicator.category.as_str(),
            row.indicator.unit,
            latest,
            collected,
            variation
        );
    }

    println!("\nBy category:");
    for stat in &stats {
        println!("  {:<10} {}", stat.category.as_str(), stat.count);
    }

    Ok(())
}
