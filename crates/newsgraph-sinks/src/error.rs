use thiserror::Error;

/// Errors returned by the columnar and graph sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Network or TLS failure talking to the columnar store.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The columnar store rejected a statement.
    #[error("ClickHouse returned status {status}: {message}")]
    ClickHouse { status: u16, message: String },

    /// Bolt protocol or query failure from the graph store.
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    /// The sink could not be reached or is not configured.
    #[error("{sink} unavailable: {reason}")]
    Unavailable { sink: &'static str, reason: String },

    /// The whole load did not finish within the configured timeout.
    #[error("{sink} load timed out after {secs}s")]
    Timeout { sink: &'static str, secs: u64 },

    /// Every row in a non-empty batch failed to write.
    #[error("{sink} rejected all {failed} rows; last error: {last_error}")]
    Rejected {
        sink: &'static str,
        failed: usize,
        last_error: String,
    },

    /// A row read back from the store did not match the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
