//! The orchestrator: ingest, enrich, then load both sinks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use newsgraph_core::{AppConfig, Batch, Settings};
use newsgraph_sinks::{prepare_rows, ArticleRow, ColumnarSink, GraphSink, MergeOutcome, SinkError};

use crate::breaking::BreakingClassifier;
use crate::cancel::CancelFlag;
use crate::enrich::Enricher;
use crate::geocode::{CachedGeocoder, GeocodeBackend, GeocodePolicy};
use crate::ingest::ingest;
use crate::locations::LocationExtractor;
use crate::report::{BatchState, BatchSummary, ColumnarReport, GraphReport, RunReport};
use crate::retry::worst_case_duration;
use crate::sources::ArticleSource;
use crate::topics::TopicModel;

/// Concurrency and timeout limits for a [`Pipeline`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineLimits {
    pub workers: usize,
    pub source_timeout: Duration,
    pub sink_timeout: Duration,
    pub geocode: GeocodePolicy,
}

impl PipelineLimits {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            workers: config.geocode_workers,
            source_timeout: Self::source_budget(
                Duration::from_secs(config.source_timeout_secs),
                config.source_max_retries,
                config.source_backoff_base_ms,
            ),
            sink_timeout: Duration::from_secs(config.sink_timeout_secs),
            geocode: GeocodePolicy::from_config(config),
        }
    }

    /// Deadline for one category fetch that leaves room for the source's own
    /// retries: every attempt at `request_timeout`, the back-off sleeps
    /// between them, and one second of slack.
    #[must_use]
    pub fn source_budget(request_timeout: Duration, max_retries: u32, backoff_base_ms: u64) -> Duration {
        worst_case_duration(request_timeout, max_retries, backoff_base_ms)
            .saturating_add(Duration::from_secs(1))
    }
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            workers: 4,
            source_timeout: Duration::from_secs(30),
            sink_timeout: Duration::from_secs(120),
            geocode: GeocodePolicy::default(),
        }
    }
}

/// Per-invocation switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Enrich but do not touch either sink.
    pub dry_run: bool,
    /// On cancellation, load what has been enriched so far instead of
    /// committing nothing.
    pub flush_partial_on_cancel: bool,
}

/// What a run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub batch: Batch,
    pub report: RunReport,
}

/// Collaborators and limits for running batches.
pub struct Pipeline {
    pub source: Arc<dyn ArticleSource>,
    pub topic_model: Arc<dyn TopicModel>,
    pub extractor: Arc<dyn LocationExtractor>,
    pub geocode_backend: Arc<dyn GeocodeBackend>,
    pub columnar: Arc<dyn ColumnarSink>,
    pub graph: Arc<dyn GraphSink>,
    pub limits: PipelineLimits,
}

impl Pipeline {
    /// Run one batch end to end.
    ///
    /// Never fails: source, stage and sink failures are reported in the
    /// returned [`RunReport`].
    pub async fn run(&self, settings: &Settings, options: RunOptions, cancel: &CancelFlag) -> RunOutput {
        let started_at = Utc::now();
        let mut batch = Batch::new(started_at, settings.active_categories.clone());
        let mut state = BatchState::Created;
        tracing::info!(
            run_id = %batch.run_id,
            categories = ?batch.categories,
            max_articles = settings.max_articles,
            dry_run = options.dry_run,
            "run started"
        );

        let ingested = ingest(
            self.source.as_ref(),
            &batch.categories,
            settings.max_articles,
            started_at,
            self.limits.source_timeout,
            cancel,
        )
        .await;

        let geocoder = CachedGeocoder::new(Arc::clone(&self.geocode_backend), self.limits.geocode);
        let breaking = BreakingClassifier::from_settings(settings);
        let enricher = Enricher {
            topic_model: self.topic_model.as_ref(),
            extractor: self.extractor.as_ref(),
            geocoder: &geocoder,
            breaking: &breaking,
        };
        let enriched = enricher
            .enrich_all(ingested.articles, self.limits.workers, cancel)
            .await;
        batch.articles = enriched.articles;
        transition(&mut state, BatchState::Enriched, &batch);

        let summary = BatchSummary::of(&batch.articles);
        let high_confidence: Vec<String> = breaking
            .high_confidence_breaking(&batch.articles, Utc::now())
            .into_iter()
            .map(|a| a.title.clone())
            .collect();
        let cancelled = ingested.cancelled || enriched.cancelled;

        let mut report = RunReport {
            run_id: batch.run_id,
            started_at,
            finished_at: started_at,
            state,
            dry_run: options.dry_run,
            categories: batch.categories.clone(),
            per_category: ingested.per_category,
            failed_categories: ingested.failed_categories,
            total_articles: summary.total_articles,
            articles_with_locations: summary.articles_with_locations,
            breaking_count: summary.breaking_count,
            high_confidence_breaking: high_confidence.len(),
            high_confidence_headlines: high_confidence,
            mean_sentiment: summary.mean_sentiment,
            topic_count: summary.topic_count,
            degraded: enriched.degraded,
            geocoder: geocoder.stats(),
            repaired_rows: 0,
            columnar: None,
            graph: None,
            notes: Vec::new(),
        };
        for failed in &report.failed_categories {
            report
                .notes
                .push(format!("category {} skipped: {}", failed.category, failed.error));
        }

        if cancelled && !options.flush_partial_on_cancel {
            report.notes.push("run cancelled; nothing committed".to_string());
            transition(&mut state, BatchState::Cancelled, &batch);
        } else if options.dry_run {
            report.notes.push("dry run; sinks not touched".to_string());
        } else if batch.is_empty() {
            report
                .notes
                .push("empty batch; sinks left untouched".to_string());
            transition(&mut state, BatchState::Skipped, &batch);
        } else {
            if cancelled {
                report
                    .notes
                    .push(format!("run cancelled; flushing {} enriched articles", batch.len()));
            }
            transition(&mut state, BatchState::Loading, &batch);
            let prepared = prepare_rows(&batch);
            report.repaired_rows = prepared.repaired;

            let (columnar, graph) = self.load(&prepared.rows).await;
            let columnar_ok = columnar.is_ok();
            let graph_ok = graph.is_ok();
            report.columnar = Some(match columnar {
                Ok(rows_written) => ColumnarReport {
                    rows_written,
                    error: None,
                },
                Err(e) => {
                    tracing::error!(error = %e, "columnar load failed");
                    report.notes.push(format!("columnar load failed: {e}"));
                    ColumnarReport {
                        rows_written: 0,
                        error: Some(e.to_string()),
                    }
                }
            });
            report.graph = Some(match graph {
                Ok(outcome) => {
                    if outcome.failed > 0 {
                        report
                            .notes
                            .push(format!("graph merge skipped {} articles", outcome.failed));
                    }
                    GraphReport {
                        merged: outcome.merged,
                        failed: outcome.failed,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "graph load failed");
                    report.notes.push(format!("graph load failed: {e}"));
                    GraphReport {
                        merged: 0,
                        failed: batch.len(),
                        error: Some(e.to_string()),
                    }
                }
            });
            transition(&mut state, BatchState::after_load(columnar_ok, graph_ok), &batch);
        }

        report.state = state;
        report.finished_at = Utc::now();
        tracing::info!(
            run_id = %report.run_id,
            state = ?report.state,
            articles = report.total_articles,
            breaking = report.breaking_count,
            mean_sentiment = report.mean_sentiment,
            "run finished"
        );
        RunOutput { batch, report }
    }

    /// Load both sinks concurrently, each under the sink timeout.
    async fn load(
        &self,
        rows: &[ArticleRow],
    ) -> (Result<usize, SinkError>, Result<MergeOutcome, SinkError>) {
        let timeout = self.limits.sink_timeout;
        let secs = timeout.as_secs();
        let columnar = async {
            tokio::time::timeout(timeout, self.columnar.replace_rows(rows))
                .await
                .unwrap_or(Err(SinkError::Timeout {
                    sink: "columnar",
                    secs,
                }))
        };
        let graph = async {
            tokio::time::timeout(timeout, self.graph.merge_rows(rows))
                .await
                .unwrap_or(Err(SinkError::Timeout { sink: "graph", secs }))
        };
        tokio::join!(columnar, graph)
    }
}

fn transition(state: &mut BatchState, next: BatchState, batch: &Batch) {
    let from = *state;
    tracing::info!(
        run_id = %batch.run_id,
        from = ?from,
        to = ?next,
        articles = batch.len(),
        "batch state"
    );
    *state = next;
}
