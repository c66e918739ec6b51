//! Rule-based topic assignment.

use newsgraph_core::{Topic, TopicRule};

use crate::error::EnrichError;

/// Assigns a topic to a piece of text.
///
/// Implementations may fail; the orchestrator degrades a failure to
/// [`Topic::general`].
pub trait TopicModel: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EnrichError::Topic`] if the model cannot produce an answer.
    fn assign(&self, text: &str) -> Result<Topic, EnrichError>;
}

/// First-match keyword classifier over an ordered rule table.
///
/// Keywords are matched as case-insensitive substrings of the text, so
/// `"politic"` matches "politics" and "political". Rule order decides ties:
/// "Tech stocks crash" is Technology, not Business.
#[derive(Debug, Clone)]
pub struct RuleTopicClassifier {
    rules: Vec<(Topic, Vec<String>)>,
}

impl RuleTopicClassifier {
    #[must_use]
    pub fn new(rules: &[TopicRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (rule.topic(), keywords)
            })
            .collect();
        Self { rules }
    }

    /// Total classification: no match is `(-1, "General")`.
    #[must_use]
    pub fn classify(&self, text: &str) -> Topic {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map_or_else(Topic::general, |(topic, _)| topic.clone())
    }

    /// Number of distinct topics this classifier can assign, excluding the
    /// unclassified bucket.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.rules.len()
    }
}

impl TopicModel for RuleTopicClassifier {
    fn assign(&self, text: &str) -> Result<Topic, EnrichError> {
        Ok(self.classify(text))
    }
}

#[cfg(test)]
mod tests {
    use newsgraph_core::default_topic_rules;

    use super::*;

    fn classifier() -> RuleTopicClassifier {
        RuleTopicClassifier::new(&default_topic_rules())
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(
            classifier().classify("HOSPITAL staff strike"),
            Topic::new(3, "Health")
        );
    }

    #[test]
    fn substring_keyword_matches_longer_word() {
        assert_eq!(
            classifier().classify("Political debate tonight"),
            Topic::new(4, "Politics")
        );
    }

    #[test]
    fn first_rule_in_order_wins() {
        // Both "tech" and "market" match; Technology is declared first.
        assert_eq!(
            classifier().classify("Tech stocks crash as market slides"),
            Topic::new(0, "Technology")
        );
    }

    #[test]
    fn no_match_is_general() {
        let topic = classifier().classify("Local bakery opens");
        assert!(topic.is_unclassified());
        assert_eq!(topic.label, "General");
    }

    #[test]
    fn empty_and_non_ascii_input_are_general() {
        assert_eq!(classifier().classify(""), Topic::general());
        assert_eq!(classifier().classify("東京の天気"), Topic::general());
    }

    #[test]
    fn custom_rules_are_respected() {
        let rules = vec![TopicRule::new(7, "Climate", &["Climate", "carbon"])];
        let c = RuleTopicClassifier::new(&rules);
        assert_eq!(c.classify("climate summit"), Topic::new(7, "Climate"));
        assert_eq!(c.topic_count(), 1);
    }

    #[test]
    fn assign_never_fails() {
        assert!(classifier().assign("anything at all").is_ok());
    }
}
