use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a working
/// local configuration. Decoupled from the real environment so it can be
/// tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("NEWSGRAPH_LOG_LEVEL", "info");
    let settings_path = PathBuf::from(or_default(
        "NEWSGRAPH_SETTINGS_PATH",
        "./config/settings.json",
    ));
    let topics_path = PathBuf::from(or_default("NEWSGRAPH_TOPICS_PATH", "./config/topics.yaml"));

    let news_base_url = or_default("NEWSGRAPH_NEWS_BASE_URL", "https://news.google.com");
    let source_timeout_secs = parse_u64("NEWSGRAPH_SOURCE_TIMEOUT_SECS", "30")?;
    let source_max_retries = parse_u32("NEWSGRAPH_SOURCE_MAX_RETRIES", "2")?;
    let source_backoff_base_ms = parse_u64("NEWSGRAPH_SOURCE_BACKOFF_BASE_MS", "1000")?;

    let geocoder_url = or_default(
        "NEWSGRAPH_GEOCODER_URL",
        "https://nominatim.openstreetmap.org",
    );
    let geocoder_user_agent = or_default(
        "NEWSGRAPH_GEOCODER_USER_AGENT",
        "newsgraph/0.1 (news-intelligence)",
    );
    let geocoder_timeout_secs = parse_u64("NEWSGRAPH_GEOCODER_TIMEOUT_SECS", "5")?;
    let geocoder_min_interval_ms = parse_u64("NEWSGRAPH_GEOCODER_MIN_INTERVAL_MS", "1000")?;
    let geocoder_max_retries = parse_u32("NEWSGRAPH_GEOCODER_MAX_RETRIES", "2")?;
    let geocoder_backoff_base_ms = parse_u64("NEWSGRAPH_GEOCODER_BACKOFF_BASE_MS", "500")?;
    let geocode_workers = parse_usize("NEWSGRAPH_GEOCODE_WORKERS", "4")?;
    let max_locations_per_article = parse_usize("NEWSGRAPH_MAX_LOCATIONS_PER_ARTICLE", "2")?;

    let clickhouse_url = or_default("CLICKHOUSE_URL", "http://localhost:8123");
    let clickhouse_user = or_default("CLICKHOUSE_USER", "default");
    let clickhouse_password = optional("CLICKHOUSE_PASSWORD");
    let clickhouse_table = or_default("CLICKHOUSE_TABLE", "news_articles");
    if !is_sql_identifier(&clickhouse_table) {
        return Err(ConfigError::InvalidEnvVar {
            var: "CLICKHOUSE_TABLE".to_string(),
            reason: format!("'{clickhouse_table}' is not a plain table identifier"),
        });
    }

    let neo4j_uri = or_default("NEO4J_URI", "bolt://localhost:7687");
    let neo4j_user = or_default("NEO4J_USER", "neo4j");
    let neo4j_password = optional("NEO4J_PASSWORD");

    let sink_timeout_secs = parse_u64("NEWSGRAPH_SINK_TIMEOUT_SECS", "120")?;

    Ok(AppConfig {
        log_level,
        settings_path,
        topics_path,
        news_base_url,
        source_timeout_secs,
        source_max_retries,
        source_backoff_base_ms,
        geocoder_url,
        geocoder_user_agent,
        geocoder_timeout_secs,
        geocoder_min_interval_ms,
        geocoder_max_retries,
        geocoder_backoff_base_ms,
        geocode_workers,
        max_locations_per_article,
        clickhouse_url,
        clickhouse_user,
        clickhouse_password,
        clickhouse_table,
        neo4j_uri,
        neo4j_user,
        neo4j_password,
        sink_timeout_secs,
    })
}

/// The table name is interpolated into DDL, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
