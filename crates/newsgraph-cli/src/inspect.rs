//! Read-only commands: `settings` and `classify`.

use newsgraph_core::{load_settings_or_default, load_topic_rules, AppConfig, Topic};
use newsgraph_pipeline::{lexicon_score, BreakingClassifier, RuleTopicClassifier};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct Verdict {
    pub title: String,
    pub sentiment: f32,
    pub topic: Topic,
    pub is_breaking: bool,
}

pub(crate) fn print_settings(config: &AppConfig) -> anyhow::Result<()> {
    let settings = load_settings_or_default(&config.settings_path);
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Classify one headline the way a run would.
pub(crate) fn verdict(
    topics: &RuleTopicClassifier,
    breaking: &BreakingClassifier,
    title: &str,
    sentiment: Option<f32>,
) -> Verdict {
    let sentiment = sentiment.unwrap_or_else(|| lexicon_score(title));
    Verdict {
        title: title.to_string(),
        sentiment,
        topic: topics.classify(title),
        is_breaking: breaking.is_breaking(title, sentiment),
    }
}

pub(crate) fn classify_headline(
    config: &AppConfig,
    title: &str,
    sentiment: Option<f32>,
) -> anyhow::Result<()> {
    let rules = load_topic_rules(&config.topics_path)?;
    let topics = RuleTopicClassifier::new(&rules);
    let settings = load_settings_or_default(&config.settings_path);
    let breaking = BreakingClassifier::from_settings(&settings);

    let verdict = verdict(&topics, &breaking, title, sentiment);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
