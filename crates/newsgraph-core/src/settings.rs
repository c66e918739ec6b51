//! Per-run pipeline settings.
//!
//! The settings file is a loose JSON key-value document shared with other
//! tools, so every key is optional and unknown keys are ignored. The file is
//! read once per run and resolved into an explicit [`Settings`] value that is
//! passed to the pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_MAX_ARTICLES: usize = 20;
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Technology", "Business", "Sports", "Health", "Politics"];
/// `|sentiment|` above this marks an article breaking during batch classification.
pub const DEFAULT_SENTIMENT_THRESHOLD: f32 = 0.5;
/// `|sentiment|` above this qualifies for the high-confidence breaking view.
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_BREAKING_KEYWORDS: [&str; 6] = [
    "breaking",
    "urgent",
    "alert",
    "emergency",
    "crisis",
    "developing",
];

/// The settings file as written on disk. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    pub max_articles: Option<usize>,
    pub active_categories: Option<Vec<String>>,
    pub sentiment_threshold: Option<f32>,
    pub high_confidence_threshold: Option<f32>,
    pub breaking_keywords: Option<Vec<String>>,
}

/// Settings resolved for one run, with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub max_articles: usize,
    pub active_categories: Vec<String>,
    pub sentiment_threshold: f32,
    pub high_confidence_threshold: f32,
    pub breaking_keywords: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(SettingsFile::default())
    }
}

impl Settings {
    /// Apply defaults to a partially populated settings file.
    ///
    /// Thresholds that are negative or not finite are replaced by their
    /// defaults. Blank category names and keywords are dropped; keywords are
    /// lower-cased because the breaking classifier matches lower-cased titles.
    #[must_use]
    pub fn resolve(file: SettingsFile) -> Self {
        let active_categories = file.active_categories.map_or_else(
            || DEFAULT_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
            |cats| {
                cats.into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            },
        );

        let breaking_keywords = file.breaking_keywords.map_or_else(
            || DEFAULT_BREAKING_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
            |kws| {
                kws.into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect()
            },
        );

        Self {
            max_articles: file.max_articles.unwrap_or(DEFAULT_MAX_ARTICLES),
            active_categories,
            sentiment_threshold: valid_threshold(
                file.sentiment_threshold,
                DEFAULT_SENTIMENT_THRESHOLD,
            ),
            high_confidence_threshold: valid_threshold(
                file.high_confidence_threshold,
                DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
            ),
            breaking_keywords,
        }
    }
}

fn valid_threshold(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => {
            tracing::warn!(value = v, default, "ignoring invalid sentiment threshold");
            default
        }
        None => default,
    }
}

/// Load settings from a JSON file.
///
/// A missing file is not an error: the documented defaults are returned.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] if the file exists but cannot be read, or
/// [`ConfigError::SettingsParse`] if it is not valid JSON of the expected shape.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "settings file not found, using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    let file: SettingsFile = serde_json::from_str(&content)?;
    Ok(Settings::resolve(file))
}

/// Like [`load_settings`], but an unreadable or malformed file only logs a
/// warning and falls back to the defaults.
#[must_use]
pub fn load_settings_or_default(path: &Path) -> Settings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
            Settings::default()
        }
    }
}
