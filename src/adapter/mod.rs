use anyhow::Result;
use async_trait::async_trait;

use crate::models::NormalizedReading;

/// Boundary for external collectors (PTAX-style currency services, price
/// index publishers, scrapers). Implementations fetch from wherever they
/// fetch and hand the core a batch of normalized payloads; items an adapter
/// could not obtain simply never appear in the batch.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;
    async fn collect(&self) -> Result<Vec<NormalizedReading>>;
}
