use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::article::{Topic, GENERAL_LABEL};
use crate::ConfigError;

/// One row of the topic rule table: any keyword hit assigns `(id, label)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    pub id: i32,
    pub label: String,
    pub keywords: Vec<String>,
}

impl TopicRule {
    #[must_use]
    pub fn new(id: i32, label: &str, keywords: &[&str]) -> Self {
        Self {
            id,
            label: label.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> Topic {
        Topic::new(self.id, self.label.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct TopicsFile {
    pub rules: Vec<TopicRule>,
}

/// The built-in rule table, in match order.
#[must_use]
pub fn default_topic_rules() -> Vec<TopicRule> {
    vec![
        TopicRule::new(0, "Technology", &["tech", "ai", "digital", "cyber"]),
        TopicRule::new(1, "Business", &["business", "market", "economy", "finance"]),
        TopicRule::new(2, "Sports", &["sport", "game", "player", "team"]),
        TopicRule::new(3, "Health", &["health", "medical", "hospital", "doctor"]),
        TopicRule::new(4, "Politics", &["politic", "government", "election", "policy"]),
    ]
}

/// Load and validate the topic rule table from a YAML file.
///
/// A missing file yields [`default_topic_rules`]. Rule order in the file is
/// match order.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_topic_rules(path: &Path) -> Result<Vec<TopicRule>, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "topic rules file not found, using built-in rules");
        return Ok(default_topic_rules());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let topics_file: TopicsFile = serde_yaml::from_str(&content)?;

    validate_topic_rules(&topics_file.rules)?;

    Ok(topics_file.rules)
}

/// Check a rule table before it is used for classification.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] describing the first offending rule.
pub fn validate_topic_rules(rules: &[TopicRule]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_labels = HashSet::new();

    for rule in rules {
        if rule.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "topic rule {} has an empty label",
                rule.id
            )));
        }

        if rule.id == Topic::UNCLASSIFIED_ID {
            return Err(ConfigError::Validation(format!(
                "topic '{}' uses id {}, which is reserved for unclassified text",
                rule.label,
                Topic::UNCLASSIFIED_ID
            )));
        }

        if rule.label.trim().eq_ignore_ascii_case(GENERAL_LABEL) {
            return Err(ConfigError::Validation(format!(
                "topic label '{}' is reserved for unclassified text",
                rule.label
            )));
        }

        if rule.keywords.is_empty() || rule.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "topic '{}' must list at least one keyword and no blank keywords",
                rule.label
            )));
        }

        if !seen_ids.insert(rule.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate topic id {} (label '{}')",
                rule.id, rule.label
            )));
        }

        if !seen_labels.insert(rule.label.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate topic label: '{}'",
                rule.label
            )));
        }
    }

    Ok(())
}
