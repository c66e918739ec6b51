//! Columnar sink: a ClickHouse table replaced wholesale on every load.

use std::time::Duration;

use async_trait::async_trait;

use newsgraph_core::Batch;

use crate::error::SinkError;
use crate::row::{prepare_rows, ArticleRow};

const SINK: &str = "clickhouse";

/// Column list shared by the DDL, the insert and the backfill select.
const COLUMNS: &str = "title, description, content, published_at, url, publisher, category, \
                       sentiment, processed_at, topic_id, topic_label, locations, coordinates, \
                       is_breaking";

/// A store that holds exactly one snapshot of enriched articles.
#[async_trait]
pub trait ColumnarSink: Send + Sync {
    /// Replace the stored snapshot with `rows`. Returns the number of rows
    /// written.
    ///
    /// Readers must observe either the previous snapshot or the new one.
    async fn replace_rows(&self, rows: &[ArticleRow]) -> Result<usize, SinkError>;

    /// Read up to `limit` rows from the current snapshot, newest first.
    async fn fetch_rows(&self, limit: usize) -> Result<Vec<ArticleRow>, SinkError>;

    /// Prepare `batch` (defaults plus the pairing check) and replace the
    /// snapshot with it.
    async fn load(&self, batch: &Batch) -> Result<usize, SinkError> {
        let prepared = prepare_rows(batch);
        self.replace_rows(&prepared.rows).await
    }
}

/// ClickHouse over its HTTP interface.
///
/// Statements go in the POST body (or the `query` parameter when the body
/// carries insert data); credentials travel in the `X-ClickHouse-User` and
/// `X-ClickHouse-Key` headers.
pub struct ClickHouseSink {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: Option<String>,
    table: String,
}

impl ClickHouseSink {
    /// Build a sink for `table` at `base_url`.
    ///
    /// `table` is interpolated into DDL and must already be a validated
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        user: &str,
        password: Option<String>,
        table: &str,
        timeout_secs: u64,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password,
            table: table.to_string(),
        })
    }

    fn staging_table(&self) -> String {
        format!("{}_staging", self.table)
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}/", self.base_url))
            .header("X-ClickHouse-User", &self.user);
        match &self.password {
            Some(password) => builder.header("X-ClickHouse-Key", password),
            None => builder,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<String, SinkError> {
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(SinkError::ClickHouse {
                status: status.as_u16(),
                message: body.trim().to_string(),
            })
        }
    }

    /// Run one statement with no input data.
    async fn execute(&self, sql: &str) -> Result<String, SinkError> {
        tracing::debug!(sql = %first_line(sql), "clickhouse statement");
        let resp = self.request().body(sql.to_string()).send().await?;
        Self::check(resp).await
    }

    /// Run an `INSERT ... FORMAT JSONEachRow` with `rows` as the body.
    async fn insert(&self, table: &str, rows: &[ArticleRow]) -> Result<(), SinkError> {
        let mut body = String::new();
        for row in rows {
            let line = serde_json::to_string(row).map_err(|source| SinkError::Deserialize {
                context: format!("row {}", row.url),
                source,
            })?;
            body.push_str(&line);
            body.push('\n');
        }

        let sql = format!("INSERT INTO {table} ({COLUMNS}) FORMAT JSONEachRow");
        tracing::debug!(sql = %sql, rows = rows.len(), "clickhouse insert");
        let resp = self
            .request()
            .query(&[("query", sql.as_str())])
            .body(body)
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }
}

#[async_trait]
impl ColumnarSink for ClickHouseSink {
    async fn replace_rows(&self, rows: &[ArticleRow]) -> Result<usize, SinkError> {
        let staging = self.staging_table();

        self.execute(&format!("DROP TABLE IF EXISTS {staging}"))
            .await?;
        self.execute(&create_table_sql(&staging, false)).await?;
        if !rows.is_empty() {
            self.insert(&staging, rows).await?;
        }
        self.execute(&create_table_sql(&self.table, true)).await?;
        self.execute(&format!("EXCHANGE TABLES {staging} AND {}", self.table))
            .await?;

        // The new snapshot is already live; a leftover staging table is
        // dropped on the next load.
        if let Err(e) = self
            .execute(&format!("DROP TABLE IF EXISTS {staging}"))
            .await
        {
            tracing::warn!(table = %staging, error = %e, "failed to drop staging table");
        }

        tracing::info!(table = %self.table, rows = rows.len(), "columnar snapshot replaced");
        Ok(rows.len())
    }

    async fn fetch_rows(&self, limit: usize) -> Result<Vec<ArticleRow>, SinkError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} ORDER BY published_at DESC LIMIT {limit} FORMAT JSONEachRow",
            self.table
        );
        let body = self.execute(&sql).await?;
        parse_json_each_row(&body)
    }
}

/// DDL for the article table.
#[must_use]
pub fn create_table_sql(table: &str, if_not_exists: bool) -> String {
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!(
        "CREATE TABLE {guard}{table} (
    title String,
    description String,
    content String DEFAULT description,
    published_at DateTime('UTC'),
    url String,
    publisher String,
    category String,
    sentiment Float32,
    processed_at DateTime('UTC'),
    topic_id Int32,
    topic_label String,
    locations Array(String),
    coordinates Array(Tuple(Float64, Float64)),
    is_breaking Bool DEFAULT false
) ENGINE = MergeTree()
ORDER BY published_at"
    )
}

fn parse_json_each_row(body: &str) -> Result<Vec<ArticleRow>, SinkError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| SinkError::Deserialize {
                context: format!("{SINK} row {i}"),
                source,
            })
        })
        .collect()
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql)
}
