//! `run` and `backfill-graph` command handlers.

use std::sync::Arc;

use anyhow::Context;
use newsgraph_core::{load_settings_or_default, load_topic_rules, AppConfig, Settings};
use newsgraph_pipeline::{
    backfill_graph, BatchState, CancelFlag, GazetteerExtractor, GoogleNewsSource,
    NominatimGeocoder, Pipeline, PipelineLimits, RuleTopicClassifier, RunOptions,
};
use newsgraph_sinks::{ClickHouseSink, Neo4jSink};

/// Command-line adjustments applied on top of the settings file.
#[derive(Debug, Default)]
pub(crate) struct RunOverrides {
    pub categories: Vec<String>,
    pub max_articles: Option<usize>,
    pub dry_run: bool,
    pub flush_partial: bool,
}

impl RunOverrides {
    pub(crate) fn apply(&self, mut settings: Settings) -> Settings {
        let categories: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if !categories.is_empty() {
            settings.active_categories = categories;
        }
        if let Some(max) = self.max_articles {
            settings.max_articles = max;
        }
        settings
    }
}

fn columnar_sink(config: &AppConfig) -> anyhow::Result<ClickHouseSink> {
    ClickHouseSink::new(
        &config.clickhouse_url,
        &config.clickhouse_user,
        config.clickhouse_password.clone(),
        &config.clickhouse_table,
        config.sink_timeout_secs,
    )
    .context("failed to build ClickHouse client")
}

fn graph_sink(config: &AppConfig) -> Neo4jSink {
    Neo4jSink::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        config.neo4j_password.clone(),
    )
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let rules = load_topic_rules(&config.topics_path)?;
    let source = GoogleNewsSource::new(
        &config.news_base_url,
        config.source_timeout_secs,
        config.source_max_retries,
        config.source_backoff_base_ms,
    )
    .context("failed to build news source client")?;
    let geocoder = NominatimGeocoder::new(&config.geocoder_url, &config.geocoder_user_agent)
        .context("failed to build geocoder client")?;
    let extractor = GazetteerExtractor::with_default_gazetteer(config.max_locations_per_article)?;

    Ok(Pipeline {
        source: Arc::new(source),
        topic_model: Arc::new(RuleTopicClassifier::new(&rules)),
        extractor: Arc::new(extractor),
        geocode_backend: Arc::new(geocoder),
        columnar: Arc::new(columnar_sink(config)?),
        graph: Arc::new(graph_sink(config)),
        limits: PipelineLimits::from_config(config),
    })
}

/// Spawn a task that sets `cancel` on the first Ctrl-C.
fn cancel_on_ctrl_c(cancel: &CancelFlag) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received ctrl-c, finishing in-flight articles");
            cancel.cancel();
        }
    });
}

/// Run one batch and print its report as JSON.
///
/// # Errors
///
/// Returns an error if the collaborators cannot be built or the batch ends
/// in [`BatchState::Failed`]. Partial failures are reported, not returned.
pub(crate) async fn run_batch(config: &AppConfig, overrides: RunOverrides) -> anyhow::Result<()> {
    let settings = overrides.apply(load_settings_or_default(&config.settings_path));
    let pipeline = build_pipeline(config)?;
    let options = RunOptions {
        dry_run: overrides.dry_run,
        flush_partial_on_cancel: overrides.flush_partial,
    };

    let cancel = CancelFlag::new();
    cancel_on_ctrl_c(&cancel);

    let output = pipeline.run(&settings, options, &cancel).await;
    println!("{}", serde_json::to_string_pretty(&output.report)?);

    if output.report.state == BatchState::Failed {
        anyhow::bail!("run {} failed: neither sink accepted the batch", output.report.run_id);
    }
    Ok(())
}

/// Merge the newest `limit` columnar rows into the graph.
///
/// # Errors
///
/// Returns an error if either sink fails.
pub(crate) async fn run_backfill(config: &AppConfig, limit: usize) -> anyhow::Result<()> {
    let columnar = columnar_sink(config)?;
    let graph = graph_sink(config);
    let report = backfill_graph(&columnar, &graph, limit)
        .await
        .context("graph backfill failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
