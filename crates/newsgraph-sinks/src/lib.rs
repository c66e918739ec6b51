//! Sinks for enriched news batches.
//!
//! Two independent stores receive every batch: a columnar analytical table
//! (ClickHouse) that is replaced wholesale each run, and a graph store
//! (Neo4j) that is merged into by natural key. Both consume the same
//! [`ArticleRow`]s, which re-check the location/coordinate pairing and fill
//! scalar defaults before anything is written.

pub mod columnar;
pub mod error;
pub mod graph;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod row;

pub use columnar::{ClickHouseSink, ColumnarSink};
pub use error::SinkError;
pub use graph::{GraphSink, MergeOutcome, Neo4jSink};
pub use row::{prepare_rows, repair_rows, ArticleRow, PreparedRows};
