use thiserror::Error;

/// Errors from an external lookup: article source or geocoder.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// The lookup did not finish within its deadline.
    #[error("{service} request timed out after {secs}s")]
    Timeout { service: &'static str, secs: u64 },

    /// The feed body is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Returns `true` for errors that are worth retrying after a back-off
    /// delay: transport failures, timeouts, HTTP 429 and HTTP 5xx.
    ///
    /// Client errors and malformed bodies are returned immediately; retrying
    /// would produce the same answer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Timeout { .. } => true,
            Self::Xml(_) | Self::Deserialize { .. } => false,
        }
    }
}

/// Errors from an enrichment stage. None of these abort a run; the
/// orchestrator degrades the affected field to its default.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("location extraction failed: {0}")]
    Extraction(String),

    #[error("topic assignment failed: {0}")]
    Topic(String),
}
