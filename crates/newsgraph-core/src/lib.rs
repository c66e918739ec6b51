//! Shared data model and configuration for the newsgraph pipeline.
//!
//! Holds the article/batch types that flow from ingest through enrichment to
//! the sinks, the per-run [`Settings`] resolved from the settings file, the
//! topic rule table, and the environment-driven [`AppConfig`].

pub mod app_config;
pub mod article;
pub mod config;
pub mod settings;
pub mod topics;

use thiserror::Error;

pub use app_config::AppConfig;
pub use article::{Article, Batch, GeoPoint, IngestedArticle, Place, RawArticle, Topic};
pub use config::{load_app_config, load_app_config_from_env};
pub use settings::{load_settings, load_settings_or_default, Settings, SettingsFile};
pub use topics::{default_topic_rules, load_topic_rules, TopicRule, TopicsFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("failed to parse topic rules file: {0}")]
    TopicsParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
