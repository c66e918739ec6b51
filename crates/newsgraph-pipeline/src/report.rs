//! Run metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use newsgraph_core::Article;

use crate::enrich::DegradedStages;
use crate::geocode::GeocodeStats;
use crate::ingest::{CategoryCount, FailedCategory};

/// Where a batch ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Created,
    Enriched,
    Loading,
    /// Both sinks accepted the batch.
    Loaded,
    /// Exactly one sink accepted the batch.
    PartiallyLoaded,
    /// Neither sink accepted the batch.
    Failed,
    /// Cancelled before anything was committed.
    Cancelled,
    /// Nothing to load; both sinks were left untouched.
    Skipped,
}

impl BatchState {
    /// Terminal state after both sink loads have returned.
    #[must_use]
    pub fn after_load(columnar_ok: bool, graph_ok: bool) -> Self {
        match (columnar_ok, graph_ok) {
            (true, true) => Self::Loaded,
            (false, false) => Self::Failed,
            _ => Self::PartiallyLoaded,
        }
    }
}

/// Outcome of the columnar replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnarReport {
    pub rows_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the graph merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    pub merged: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a run reports about itself. Printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: BatchState,
    pub dry_run: bool,
    pub categories: Vec<String>,
    pub per_category: Vec<CategoryCount>,
    pub failed_categories: Vec<FailedCategory>,
    pub total_articles: usize,
    pub articles_with_locations: usize,
    pub breaking_count: usize,
    pub high_confidence_breaking: usize,
    pub high_confidence_headlines: Vec<String>,
    pub mean_sentiment: f32,
    pub topic_count: usize,
    pub degraded: DegradedStages,
    pub geocoder: GeocodeStats,
    pub repaired_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columnar: Option<ColumnarReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphReport>,
    pub notes: Vec<String>,
}

/// Batch-level aggregates over the enriched articles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchSummary {
    pub total_articles: usize,
    pub articles_with_locations: usize,
    pub breaking_count: usize,
    pub mean_sentiment: f32,
    /// Distinct topic labels present in the batch.
    pub topic_count: usize,
}

impl BatchSummary {
    #[must_use]
    pub fn of(articles: &[Article]) -> Self {
        let total_articles = articles.len();
        let mut labels: Vec<&str> = articles.iter().map(|a| a.topic.label.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();

        #[allow(clippy::cast_precision_loss)]
        let mean_sentiment = if total_articles == 0 {
            0.0
        } else {
            articles.iter().map(|a| a.sentiment).sum::<f32>() / total_articles as f32
        };

        Self {
            total_articles,
            articles_with_locations: articles.iter().filter(|a| !a.places.is_empty()).count(),
            breaking_count: articles.iter().filter(|a| a.is_breaking).count(),
            mean_sentiment,
            topic_count: labels.len(),
        }
    }
}
