//! In-memory sinks with the same replace/merge semantics as the real stores,
//! for pipeline tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::columnar::ColumnarSink;
use crate::error::SinkError;
use crate::graph::{GraphSink, MergeOutcome};
use crate::row::ArticleRow;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Columnar sink holding a single snapshot.
#[derive(Default)]
pub struct MemoryColumnarSink {
    rows: Mutex<Vec<ArticleRow>>,
    loads: Mutex<usize>,
    failing: Mutex<bool>,
}

impl MemoryColumnarSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`SinkError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.failing) = failing;
    }

    #[must_use]
    pub fn rows(&self) -> Vec<ArticleRow> {
        lock(&self.rows).clone()
    }

    /// Number of successful `replace_rows` calls.
    #[must_use]
    pub fn load_count(&self) -> usize {
        *lock(&self.loads)
    }

    fn check_available(&self) -> Result<(), SinkError> {
        if *lock(&self.failing) {
            return Err(SinkError::Unavailable {
                sink: "memory-columnar",
                reason: "configured to fail".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ColumnarSink for MemoryColumnarSink {
    async fn replace_rows(&self, rows: &[ArticleRow]) -> Result<usize, SinkError> {
        self.check_available()?;
        *lock(&self.rows) = rows.to_vec();
        *lock(&self.loads) += 1;
        Ok(rows.len())
    }

    async fn fetch_rows(&self, limit: usize) -> Result<Vec<ArticleRow>, SinkError> {
        self.check_available()?;
        let mut rows = lock(&self.rows).clone();
        rows.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Node identity: label plus natural key.
pub type NodeKey = (&'static str, String);

/// Edge identity: relationship type plus endpoint keys.
pub type EdgeKey = (&'static str, NodeKey, NodeKey);

#[derive(Default)]
struct GraphState {
    nodes: BTreeSet<NodeKey>,
    edges: BTreeSet<EdgeKey>,
    articles: BTreeMap<String, ArticleRow>,
    locations: BTreeMap<String, (f64, f64)>,
}

/// Graph sink keeping keyed node and edge sets.
#[derive(Default)]
pub struct MemoryGraphSink {
    state: Mutex<GraphState>,
    failing_urls: Mutex<HashSet<String>>,
    unavailable: Mutex<bool>,
}

impl MemoryGraphSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the merge of the article at `url` fail.
    pub fn fail_url(&self, url: &str) {
        lock(&self.failing_urls).insert(url.to_string());
    }

    /// Make every merge fail before any article is written.
    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        lock(&self.state).nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        lock(&self.state).edges.len()
    }

    #[must_use]
    pub fn has_node(&self, label: &'static str, key: &str) -> bool {
        lock(&self.state).nodes.contains(&(label, key.to_string()))
    }

    #[must_use]
    pub fn has_edge(&self, kind: &'static str, from: NodeKey, to: NodeKey) -> bool {
        lock(&self.state).edges.contains(&(kind, from, to))
    }

    #[must_use]
    pub fn article(&self, url: &str) -> Option<ArticleRow> {
        lock(&self.state).articles.get(url).cloned()
    }

    #[must_use]
    pub fn location(&self, name: &str) -> Option<(f64, f64)> {
        lock(&self.state).locations.get(name).copied()
    }

    fn merge_row(state: &mut GraphState, row: &ArticleRow) {
        let publisher = ("Publisher", row.publisher.clone());
        let article = ("Article", row.url.clone());
        let topic = ("Topic", row.topic_label.clone());

        state.nodes.insert(publisher.clone());
        state.nodes.insert(article.clone());
        state.articles.insert(row.url.clone(), row.clone());
        state
            .edges
            .retain(|(kind, from, to)| !(*kind == "PUBLISHED" && *to == article && *from != publisher));
        state
            .edges
            .insert(("PUBLISHED", publisher, article.clone()));

        state
            .edges
            .retain(|(kind, from, to)| !(*kind == "BELONGS_TO" && *from == article && *to != topic));
        state.nodes.insert(topic.clone());
        state
            .edges
            .insert(("BELONGS_TO", article.clone(), topic));

        state.edges.retain(|(kind, from, to)| {
            !(*kind == "MENTIONS" && *from == article && !row.locations.contains(&to.1))
        });

        for (name, point) in row.locations.iter().zip(&row.coordinates) {
            let location = ("Location", name.clone());
            state.nodes.insert(location.clone());
            state.locations.insert(name.clone(), *point);
            state.edges.insert(("MENTIONS", article.clone(), location));
        }
    }
}

#[async_trait]
impl GraphSink for MemoryGraphSink {
    async fn merge_rows(&self, rows: &[ArticleRow]) -> Result<MergeOutcome, SinkError> {
        if *lock(&self.unavailable) {
            return Err(SinkError::Unavailable {
                sink: "memory-graph",
                reason: "configured to fail".to_string(),
            });
        }

        let failing = lock(&self.failing_urls).clone();
        let mut state = lock(&self.state);
        let mut outcome = MergeOutcome::default();
        for row in rows {
            if row.url.is_empty() || failing.contains(&row.url) {
                outcome.failed += 1;
                continue;
            }
            Self::merge_row(&mut state, row);
            outcome.merged += 1;
        }

        if outcome.merged == 0 && outcome.failed > 0 {
            return Err(SinkError::Rejected {
                sink: "memory-graph",
                failed: outcome.failed,
                last_error: "configured to fail".to_string(),
            });
        }
        Ok(outcome)
    }
}
