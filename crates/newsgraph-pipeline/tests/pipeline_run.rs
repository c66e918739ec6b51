//! End-to-end runs against stub collaborators and the in-memory sinks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use newsgraph_core::{default_topic_rules, GeoPoint, RawArticle, Settings};
use newsgraph_pipeline::{
    ArticleSource, BatchState, CancelFlag, FetchError, GazetteerExtractor, GeocodeBackend,
    GeocodePolicy, Pipeline, PipelineLimits, RuleTopicClassifier, RunOptions,
};
use newsgraph_sinks::memory::{MemoryColumnarSink, MemoryGraphSink};
use newsgraph_sinks::{ArticleRow, ColumnarSink};

/// Serves fixed headlines per category; unknown categories fail.
struct StubSource {
    feeds: HashMap<String, Vec<&'static str>>,
}

impl StubSource {
    fn new(feeds: &[(&str, Vec<&'static str>)]) -> Self {
        Self {
            feeds: feeds
                .iter()
                .map(|(c, titles)| ((*c).to_string(), titles.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl ArticleSource for StubSource {
    async fn fetch(&self, category: &str, max_results: usize) -> Result<Vec<RawArticle>, FetchError> {
        let titles = self.feeds.get(category).ok_or(FetchError::Status {
            service: "stub",
            status: 503,
        })?;
        let published = Utc::now() - chrono::Duration::minutes(10);
        Ok(titles
            .iter()
            .take(max_results)
            .enumerate()
            .map(|(i, title)| RawArticle {
                title: (*title).to_string(),
                description: String::new(),
                published_at: Some(published),
                url: format!("https://news.example.com/{category}/{i}"),
                publisher: "Reuters".to_string(),
            })
            .collect())
    }
}

/// Resolves Paris and Berlin, misses everything else. Optionally cancels the
/// run on its first lookup.
struct StubGeocoder {
    cancel_on_lookup: Option<CancelFlag>,
}

#[async_trait]
impl GeocodeBackend for StubGeocoder {
    async fn lookup(&self, place: &str) -> Result<Option<GeoPoint>, FetchError> {
        if let Some(flag) = &self.cancel_on_lookup {
            flag.cancel();
        }
        Ok(match place {
            "Paris" => Some(GeoPoint::new(48.85, 2.35)),
            "Berlin" => Some(GeoPoint::new(52.52, 13.40)),
            _ => None,
        })
    }
}

struct Harness {
    pipeline: Pipeline,
    columnar: Arc<MemoryColumnarSink>,
    graph: Arc<MemoryGraphSink>,
}

fn harness(source: StubSource, cancel_on_lookup: Option<CancelFlag>) -> Harness {
    let columnar = Arc::new(MemoryColumnarSink::new());
    let graph = Arc::new(MemoryGraphSink::new());
    let pipeline = Pipeline {
        source: Arc::new(source),
        topic_model: Arc::new(RuleTopicClassifier::new(&default_topic_rules())),
        extractor: Arc::new(GazetteerExtractor::with_default_gazetteer(2).unwrap()),
        geocode_backend: Arc::new(StubGeocoder { cancel_on_lookup }),
        columnar: columnar.clone(),
        graph: graph.clone(),
        limits: PipelineLimits {
            workers: 1,
            source_timeout: Duration::from_secs(5),
            sink_timeout: Duration::from_secs(5),
            geocode: GeocodePolicy {
                timeout: Duration::from_secs(5),
                min_interval: Duration::ZERO,
                max_retries: 0,
                backoff_base_ms: 0,
            },
        },
    };
    Harness {
        pipeline,
        columnar,
        graph,
    }
}

fn settings(categories: &[&str]) -> Settings {
    Settings {
        active_categories: categories.iter().map(ToString::to_string).collect(),
        ..Settings::default()
    }
}

fn world_feed() -> StubSource {
    StubSource::new(&[(
        "World",
        vec![
            "Paris and Lagos discuss trade",
            "BREAKING: Market crashes in Berlin",
        ],
    )])
}

fn row_for<'a>(rows: &'a [ArticleRow], title: &str) -> &'a ArticleRow {
    rows.iter()
        .find(|r| r.title == title)
        .expect("row should be present")
}

#[tokio::test]
async fn run_loads_both_sinks_with_paired_locations() {
    let h = harness(world_feed(), None);
    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;

    assert_eq!(out.report.state, BatchState::Loaded);
    assert_eq!(out.report.total_articles, 2);
    assert_eq!(out.report.degraded.unresolved_places, 1);

    let rows = h.columnar.rows();
    assert_eq!(rows.len(), 2);
    let trade = row_for(&rows, "Paris and Lagos discuss trade");
    assert_eq!(trade.locations, vec!["Paris"]);
    assert_eq!(trade.coordinates, vec![(48.85, 2.35)]);
    assert!(rows.iter().all(|r| r.locations.len() == r.coordinates.len()));

    assert!(h.graph.has_node("Location", "Paris"));
    assert!(h.graph.has_node("Location", "Berlin"));
    assert!(!h.graph.has_node("Location", "Lagos"));
    assert_eq!(h.graph.location("Paris"), Some((48.85, 2.35)));
    assert_eq!(out.report.graph.as_ref().map(|g| g.merged), Some(2));
}

#[tokio::test]
async fn breaking_headline_is_flagged_and_in_high_confidence_view() {
    let h = harness(world_feed(), None);
    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;

    let rows = h.columnar.rows();
    assert!(row_for(&rows, "BREAKING: Market crashes in Berlin").is_breaking);
    assert!(out.report.breaking_count >= 1);
    assert!(out
        .report
        .high_confidence_headlines
        .iter()
        .any(|t| t == "BREAKING: Market crashes in Berlin"));
    assert!(h
        .graph
        .article("https://news.example.com/World/1")
        .is_some_and(|a| a.is_breaking));
}

#[tokio::test]
async fn failing_category_is_reported_and_others_load() {
    let h = harness(world_feed(), None);
    let out = h
        .pipeline
        .run(
            &settings(&["Sports", "World"]),
            RunOptions::default(),
            &CancelFlag::new(),
        )
        .await;

    assert_eq!(out.report.state, BatchState::Loaded);
    assert_eq!(out.report.failed_categories.len(), 1);
    assert_eq!(out.report.failed_categories[0].category, "Sports");
    assert_eq!(h.columnar.rows().len(), 2);
}

#[tokio::test]
async fn cancelled_run_commits_nothing() {
    let cancel = CancelFlag::new();
    let h = harness(world_feed(), Some(cancel.clone()));
    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &cancel)
        .await;

    assert_eq!(out.report.state, BatchState::Cancelled);
    assert_eq!(out.batch.len(), 1);
    assert_eq!(h.columnar.load_count(), 0);
    assert_eq!(h.graph.node_count(), 0);
    assert!(out.report.columnar.is_none());
}

#[tokio::test]
async fn cancelled_run_can_flush_what_was_enriched() {
    let cancel = CancelFlag::new();
    let h = harness(world_feed(), Some(cancel.clone()));
    let options = RunOptions {
        flush_partial_on_cancel: true,
        ..RunOptions::default()
    };
    let out = h.pipeline.run(&settings(&["World"]), options, &cancel).await;

    assert_eq!(out.report.state, BatchState::Loaded);
    let rows = h.columnar.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Paris and Lagos discuss trade");
    assert!(h.graph.article("https://news.example.com/World/0").is_some());
}

#[tokio::test]
async fn one_failing_sink_is_partial_and_other_sink_is_intact() {
    let h = harness(world_feed(), None);
    h.columnar.set_failing(true);
    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;

    assert_eq!(out.report.state, BatchState::PartiallyLoaded);
    assert!(out
        .report
        .columnar
        .as_ref()
        .is_some_and(|c| c.error.is_some()));
    assert!(h.graph.article("https://news.example.com/World/0").is_some());
    assert!(h.graph.article("https://news.example.com/World/1").is_some());
}

#[tokio::test]
async fn both_sinks_failing_is_failed() {
    let h = harness(world_feed(), None);
    h.columnar.set_failing(true);
    h.graph.set_unavailable(true);
    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;

    assert_eq!(out.report.state, BatchState::Failed);
    assert_eq!(out.report.notes.iter().filter(|n| n.contains("load failed")).count(), 2);
}

#[tokio::test]
async fn empty_batch_leaves_previous_snapshot_in_place() {
    let h = harness(StubSource::new(&[("World", Vec::new())]), None);
    let seed = harness(world_feed(), None);
    let seeded = seed
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;
    h.columnar
        .replace_rows(&newsgraph_sinks::prepare_rows(&seeded.batch).rows)
        .await
        .unwrap();

    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;

    assert_eq!(out.report.state, BatchState::Skipped);
    assert_eq!(h.columnar.rows().len(), 2);
    assert_eq!(h.columnar.load_count(), 1);
    assert_eq!(h.graph.node_count(), 0);
}

#[tokio::test]
async fn dry_run_enriches_without_touching_sinks() {
    let h = harness(world_feed(), None);
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let out = h
        .pipeline
        .run(&settings(&["World"]), options, &CancelFlag::new())
        .await;

    assert_eq!(out.report.state, BatchState::Enriched);
    assert_eq!(out.batch.len(), 2);
    assert_eq!(h.columnar.load_count(), 0);
    assert_eq!(h.graph.node_count(), 0);
}

#[tokio::test]
async fn report_serializes_as_json() {
    let h = harness(world_feed(), None);
    let out = h
        .pipeline
        .run(&settings(&["World"]), RunOptions::default(), &CancelFlag::new())
        .await;
    let json = serde_json::to_value(&out.report).unwrap();
    assert_eq!(json["state"], "loaded");
    assert_eq!(json["total_articles"], 2);
    assert_eq!(json["columnar"]["rows_written"], 2);
}
