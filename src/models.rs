use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// ENUMS
// ============================================================================

/// Kind of series being tracked (exchange rate, price index, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Currency,
    Index,
    Commodity,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Currency => "currency",
            Category::Index => "index",
            Category::Commodity => "commodity",
            Category::Other => "other",
        }
    }

    /// Parse a category label coming from an adapter payload.
    pub fn parse(label: &str) -> Option<Category> {
        match label {
            "currency" => Some(Category::Currency),
            "index" => Some(Category::Index),
            "commodity" => Some(Category::Commodity),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

/// Origin classification of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "api")]
    AutomatedApi,
    #[serde(rename = "manual")]
    ManualEntry,
    #[serde(rename = "scraped")]
    Scraped,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::AutomatedApi => "api",
            Provenance::ManualEntry => "manual",
            Provenance::Scraped => "scraped",
        }
    }

    pub fn parse(label: &str) -> Option<Provenance> {
        match label {
            "api" => Some(Provenance::AutomatedApi),
            "manual" => Some(Provenance::ManualEntry),
            "scraped" => Some(Provenance::Scraped),
            _ => None,
        }
    }
}

/// Collection cadence of a series. Decides the dedup window granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Monthly,
}

// ============================================================================
// STORED ROWS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub unit: String,
    pub description: Option<String>,
    pub source_hint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One collected value. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub indicator_id: i64,
    pub value: Decimal,
    pub collected_at: DateTime<Utc>,
    pub provenance: Provenance,
    /// Dedup window this reading occupies ("2026-08-07" or "2026-08").
    /// None for manual entries, which are exempt from deduplication.
    pub window_key: Option<String>,
}

/// Descriptive fields supplied when resolving or creating an indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub name: String,
    pub category: Category,
    pub unit: String,
    pub description: Option<String>,
    pub source_hint: Option<String>,
}

// ============================================================================
// INGESTION PAYLOAD & REPORT
// ============================================================================

/// Normalized payload handed over by a source adapter.
///
/// `value` and `category` stay in raw text form: parsing them is part of
/// ingestion, so a bad value fails one item instead of the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedReading {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub value: Option<String>,
    pub provenance: Provenance,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemStatus {
    Saved,
    SkippedDuplicate,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub name: String,
    pub status: ItemStatus,
    pub reason: Option<String>,
}

/// Full accounting of one ingestion run. Every input item lands in exactly
/// one bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub saved: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}

impl IngestionReport {
    pub fn record(&mut self, name: &str, status: ItemStatus, reason: Option<String>) {
        match status {
            ItemStatus::Saved => self.saved += 1,
            ItemStatus::SkippedDuplicate => self.skipped_duplicate += 1,
            ItemStatus::Failed => self.failed += 1,
        }
        self.items.push(ItemOutcome {
            name: name.to_string(),
            status,
            reason,
        });
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }
}

// ============================================================================
// READ-SIDE DTOS
// ============================================================================

/// Dashboard row: indicator metadata plus its most recent state.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorOverview {
    pub indicator: Indicator,
    pub latest: Option<Reading>,
    pub variation: Option<Decimal>,
}

/// Bounded most-recent-first history for the comparison view.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorHistory {
    pub indicator: Indicator,
    pub readings: Vec<Reading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: i64,
}
