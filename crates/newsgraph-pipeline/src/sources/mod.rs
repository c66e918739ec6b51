//! Article source abstractions.

mod google_news;
mod rss_helpers;

use async_trait::async_trait;

use newsgraph_core::RawArticle;

use crate::error::FetchError;

pub use google_news::GoogleNewsSource;

/// Fetches candidate articles for one category.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Up to `max_results` articles for `category`, in source order. May
    /// return fewer.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the category cannot be fetched after the
    /// source's own retries.
    async fn fetch(&self, category: &str, max_results: usize) -> Result<Vec<RawArticle>, FetchError>;
}
