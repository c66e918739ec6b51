//! Graph sink: Publisher, Article, Topic and Location nodes merged by
//! natural key into Neo4j.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query};
use serde::Serialize;
use tokio::sync::OnceCell;

use newsgraph_core::Batch;

use crate::error::SinkError;
use crate::row::{prepare_rows, ArticleRow};

const SINK: &str = "neo4j";

/// Per-batch result of a graph merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub merged: usize,
    pub failed: usize,
}

impl MergeOutcome {
    /// An all-failed non-empty batch becomes [`SinkError::Rejected`].
    fn into_result(self, last_error: Option<String>) -> Result<Self, SinkError> {
        if self.merged == 0 && self.failed > 0 {
            return Err(SinkError::Rejected {
                sink: SINK,
                failed: self.failed,
                last_error: last_error.unwrap_or_default(),
            });
        }
        Ok(self)
    }
}

/// A store that accumulates articles and their relationships across runs.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Merge each row as one unit. A failing row is logged and counted; the
    /// rest continue.
    ///
    /// Merging the same rows twice leaves the graph unchanged.
    async fn merge_rows(&self, rows: &[ArticleRow]) -> Result<MergeOutcome, SinkError>;

    /// Prepare `batch` (defaults plus the pairing check) and merge it.
    async fn merge(&self, batch: &Batch) -> Result<MergeOutcome, SinkError> {
        let prepared = prepare_rows(batch);
        self.merge_rows(&prepared.rows).await
    }
}

/// Neo4j over bolt.
///
/// The connection pool is opened on first use so that a missing or
/// unreachable graph store fails only this sink's load.
pub struct Neo4jSink {
    uri: String,
    user: String,
    password: Option<String>,
    graph: OnceCell<Graph>,
}

impl Neo4jSink {
    #[must_use]
    pub fn new(uri: &str, user: &str, password: Option<String>) -> Self {
        Self {
            uri: uri.to_string(),
            user: user.to_string(),
            password,
            graph: OnceCell::new(),
        }
    }

    async fn graph(&self) -> Result<&Graph, SinkError> {
        self.graph
            .get_or_try_init(|| async {
                let Some(password) = self.password.as_deref() else {
                    return Err(SinkError::Unavailable {
                        sink: SINK,
                        reason: "NEO4J_PASSWORD is not set".to_string(),
                    });
                };
                let config = ConfigBuilder::default()
                    .uri(self.uri.as_str())
                    .user(self.user.as_str())
                    .password(password)
                    .max_connections(10)
                    .build()?;
                let graph = Graph::connect(config).await?;
                tracing::info!(uri = %self.uri, "connected to neo4j");
                Ok(graph)
            })
            .await
    }

    async fn merge_one(graph: &Graph, row: &ArticleRow) -> Result<(), SinkError> {
        let mut txn = graph.start_txn().await?;
        match txn.run_queries(article_queries(row)).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(url = %row.url, error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl GraphSink for Neo4jSink {
    async fn merge_rows(&self, rows: &[ArticleRow]) -> Result<MergeOutcome, SinkError> {
        let graph = self.graph().await?;
        let mut outcome = MergeOutcome::default();
        let mut last_error = None;

        for row in rows {
            if row.url.is_empty() {
                tracing::warn!(title = %row.title, "skipping graph merge for article without url");
                outcome.failed += 1;
                last_error = Some("article has no url".to_string());
                continue;
            }
            match Self::merge_one(graph, row).await {
                Ok(()) => outcome.merged += 1,
                Err(e) => {
                    tracing::warn!(url = %row.url, error = %e, "graph merge failed for article");
                    outcome.failed += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        tracing::info!(
            merged = outcome.merged,
            failed = outcome.failed,
            "graph merge complete"
        );
        outcome.into_result(last_error)
    }
}

/// Location names and split coordinates for the `UNWIND` clause, or `None`
/// when the article mentions no resolved places.
#[must_use]
pub fn location_params(row: &ArticleRow) -> Option<(Vec<String>, Vec<f64>, Vec<f64>)> {
    if row.locations.is_empty() {
        return None;
    }
    let (lats, lons) = row.coordinates.iter().copied().unzip();
    Some((row.locations.clone(), lats, lons))
}

fn article_queries(row: &ArticleRow) -> Vec<Query> {
    let mut queries = vec![
        query(
            "MERGE (p:Publisher {name: $publisher})
             MERGE (a:Article {url: $url})
             SET a.title = $title,
                 a.sentiment = $sentiment,
                 a.published_at = datetime($published_at),
                 a.topic_label = $topic_label,
                 a.category = $category,
                 a.is_breaking = $is_breaking
             MERGE (p)-[:PUBLISHED]->(a)",
        )
        .param("publisher", row.publisher.as_str())
        .param("url", row.url.as_str())
        .param("title", row.title.as_str())
        .param("sentiment", f64::from(row.sentiment))
        .param("published_at", row.published_at.to_rfc3339())
        .param("topic_label", row.topic_label.as_str())
        .param("category", row.category.as_str())
        .param("is_breaking", row.is_breaking),
        query(
            "MATCH (p:Publisher)-[r:PUBLISHED]->(a:Article {url: $url})
             WHERE p.name <> $publisher
             DELETE r",
        )
        .param("url", row.url.as_str())
        .param("publisher", row.publisher.as_str()),
        // A re-classified article keeps a single topic edge.
        query(
            "MATCH (a:Article {url: $url})-[r:BELONGS_TO]->(t:Topic)
             WHERE t.label <> $topic_label
             DELETE r",
        )
        .param("url", row.url.as_str())
        .param("topic_label", row.topic_label.as_str()),
        query(
            "MATCH (a:Article {url: $url})
             MERGE (t:Topic {label: $topic_label})
             MERGE (a)-[:BELONGS_TO]->(t)",
        )
        .param("url", row.url.as_str())
        .param("topic_label", row.topic_label.as_str()),
        query(
            "MATCH (a:Article {url: $url})-[r:MENTIONS]->(l:Location)
             WHERE NOT l.name IN $locations
             DELETE r",
        )
        .param("url", row.url.as_str())
        .param("locations", row.locations.clone()),
    ];

    if let Some((locations, lats, lons)) = location_params(row) {
        queries.push(
            query(
                "MATCH (a:Article {url: $url})
                 UNWIND range(0, size($locations) - 1) AS i
                 MERGE (l:Location {name: $locations[i]})
                 SET l.lat = $lats[i], l.lon = $lons[i]
                 MERGE (a)-[:MENTIONS]->(l)",
            )
            .param("url", row.url.as_str())
            .param("locations", locations)
            .param("lats", lats)
            .param("lons", lons),
        );
    }

    queries
}
