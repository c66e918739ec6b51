//! Google News RSS search source.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use newsgraph_core::RawArticle;

use super::rss_helpers::parse_rss_feed;
use super::ArticleSource;
use crate::error::FetchError;
use crate::retry::retry_with_backoff;

const SERVICE: &str = "google_news";

/// Searches Google News for the category name over the last day.
pub struct GoogleNewsSource {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GoogleNewsSource {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            backoff_base_ms,
        })
    }

    fn search_url(&self, category: &str) -> String {
        let query = format!("{category} when:1d");
        let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC).to_string();
        format!(
            "{}/rss/search?q={encoded}&hl=en-US&gl=US&ceid=US:en",
            self.base_url
        )
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl ArticleSource for GoogleNewsSource {
    async fn fetch(&self, category: &str, max_results: usize) -> Result<Vec<RawArticle>, FetchError> {
        let url = self.search_url(category);
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.fetch_once(&url)
        })
        .await?;
        let articles = parse_rss_feed(&body, max_results)?;
        tracing::debug!(category, count = articles.len(), "fetched google news feed");
        Ok(articles)
    }
}
