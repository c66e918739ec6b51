//! Rebuild graph state from the current columnar snapshot.

use serde::Serialize;

use newsgraph_sinks::{repair_rows, ColumnarSink, GraphSink, SinkError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub fetched: usize,
    pub repaired: usize,
    pub merged: usize,
    pub failed: usize,
}

/// Merge the newest `limit` columnar rows into the graph.
///
/// # Errors
///
/// Returns [`SinkError`] if the columnar read fails or the graph rejects
/// every row.
pub async fn backfill_graph(
    columnar: &dyn ColumnarSink,
    graph: &dyn GraphSink,
    limit: usize,
) -> Result<BackfillReport, SinkError> {
    let rows = columnar.fetch_rows(limit).await?;
    let fetched = rows.len();
    if fetched == 0 {
        tracing::info!("columnar store is empty, nothing to backfill");
        return Ok(BackfillReport::default());
    }

    let prepared = repair_rows(rows);
    let outcome = graph.merge_rows(&prepared.rows).await?;
    tracing::info!(
        fetched,
        merged = outcome.merged,
        failed = outcome.failed,
        "graph backfill complete"
    );
    Ok(BackfillReport {
        fetched,
        repaired: prepared.repaired,
        merged: outcome.merged,
        failed: outcome.failed,
    })
}
