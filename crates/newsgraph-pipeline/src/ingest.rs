//! Ingest stage: fetch every requested category and normalize the results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use newsgraph_core::IngestedArticle;

use crate::cancel::CancelFlag;
use crate::error::FetchError;
use crate::sources::ArticleSource;

/// Articles fetched for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// A category that produced nothing because its fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCategory {
    pub category: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Categories concatenated in request order, each in source order.
    pub articles: Vec<IngestedArticle>,
    pub per_category: Vec<CategoryCount>,
    pub failed_categories: Vec<FailedCategory>,
    /// Set when the cancel flag stopped ingest before every category ran.
    pub cancelled: bool,
}

/// Fetch `categories` in order, up to `max_articles` each.
///
/// A category whose fetch fails or times out is skipped with a warning and
/// recorded; the others continue. Missing titles, publishers and publish
/// times are filled from `run_at`-based defaults.
pub async fn ingest(
    source: &dyn ArticleSource,
    categories: &[String],
    max_articles: usize,
    run_at: DateTime<Utc>,
    timeout: Duration,
    cancel: &CancelFlag,
) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();

    for category in categories {
        if cancel.is_cancelled() {
            tracing::info!(category = %category, "run cancelled, skipping remaining categories");
            outcome.cancelled = true;
            break;
        }

        let fetched = match tokio::time::timeout(timeout, source.fetch(category, max_articles)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                service: "article source",
                secs: timeout.as_secs(),
            }),
        };

        match fetched {
            Ok(raw) => {
                let count = raw.len().min(max_articles);
                outcome.articles.extend(
                    raw.into_iter()
                        .take(max_articles)
                        .map(|r| IngestedArticle::from_raw(r, category, run_at)),
                );
                tracing::info!(category = %category, count, "ingested category");
                outcome.per_category.push(CategoryCount {
                    category: category.clone(),
                    count,
                });
            }
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "category fetch failed, skipping");
                outcome.failed_categories.push(FailedCategory {
                    category: category.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}
