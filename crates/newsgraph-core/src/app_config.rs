use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub settings_path: PathBuf,
    pub topics_path: PathBuf,
    pub news_base_url: String,
    pub source_timeout_secs: u64,
    pub source_max_retries: u32,
    pub source_backoff_base_ms: u64,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_secs: u64,
    pub geocoder_min_interval_ms: u64,
    pub geocoder_max_retries: u32,
    pub geocoder_backoff_base_ms: u64,
    pub geocode_workers: usize,
    pub max_locations_per_article: usize,
    pub clickhouse_url: String,
    pub clickhouse_user: String,
    pub clickhouse_password: Option<String>,
    pub clickhouse_table: String,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: Option<String>,
    pub sink_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("settings_path", &self.settings_path)
            .field("topics_path", &self.topics_path)
            .field("news_base_url", &self.news_base_url)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("source_max_retries", &self.source_max_retries)
            .field("source_backoff_base_ms", &self.source_backoff_base_ms)
            .field("geocoder_url", &self.geocoder_url)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("geocoder_min_interval_ms", &self.geocoder_min_interval_ms)
            .field("geocoder_max_retries", &self.geocoder_max_retries)
            .field("geocoder_backoff_base_ms", &self.geocoder_backoff_base_ms)
            .field("geocode_workers", &self.geocode_workers)
            .field(
                "max_locations_per_article",
                &self.max_locations_per_article,
            )
            .field("clickhouse_url", &self.clickhouse_url)
            .field("clickhouse_user", &self.clickhouse_user)
            .field(
                "clickhouse_password",
                &self.clickhouse_password.as_ref().map(|_| "[redacted]"),
            )
            .field("clickhouse_table", &self.clickhouse_table)
            .field("neo4j_uri", &self.neo4j_uri)
            .field("neo4j_user", &self.neo4j_user)
            .field(
                "neo4j_password",
                &self.neo4j_password.as_ref().map(|_| "[redacted]"),
            )
            .field("sink_timeout_secs", &self.sink_timeout_secs)
            .finish()
    }
}
