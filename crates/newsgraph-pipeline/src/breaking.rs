//! Breaking-news classification.

use chrono::{DateTime, Duration, Utc};

use newsgraph_core::{Article, Settings};

/// Keywords that qualify a title for the high-confidence view.
pub const HIGH_CONFIDENCE_KEYWORDS: [&str; 3] = ["breaking", "urgent", "alert"];

/// Most articles returned by [`high_confidence_breaking`].
pub const HIGH_CONFIDENCE_LIMIT: usize = 10;

/// Keyword table plus the two sentiment thresholds.
#[derive(Debug, Clone)]
pub struct BreakingClassifier {
    keywords: Vec<String>,
    batch_threshold: f32,
    high_confidence_threshold: f32,
}

impl BreakingClassifier {
    #[must_use]
    pub fn new(keywords: &[String], batch_threshold: f32, high_confidence_threshold: f32) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            batch_threshold,
            high_confidence_threshold,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.breaking_keywords,
            settings.sentiment_threshold,
            settings.high_confidence_threshold,
        )
    }

    /// True if the lower-cased title contains a keyword or `|sentiment|`
    /// exceeds the batch threshold.
    #[must_use]
    pub fn is_breaking(&self, title: &str, sentiment: f32) -> bool {
        let lowered = title.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
            || sentiment.abs() > self.batch_threshold
    }

    #[must_use]
    pub fn batch_threshold(&self) -> f32 {
        self.batch_threshold
    }

    #[must_use]
    pub fn high_confidence_threshold(&self) -> f32 {
        self.high_confidence_threshold
    }

    /// The high-confidence view of `articles` as of `now`.
    ///
    /// Keeps articles published within the last hour whose title contains
    /// "breaking", "urgent" or "alert", or whose `|sentiment|` exceeds the
    /// high-confidence threshold. Newest first, at most ten.
    #[must_use]
    pub fn high_confidence_breaking<'a>(
        &self,
        articles: &'a [Article],
        now: DateTime<Utc>,
    ) -> Vec<&'a Article> {
        let cutoff = now - Duration::hours(1);
        let mut hits: Vec<&Article> = articles
            .iter()
            .filter(|a| a.published_at >= cutoff && a.published_at <= now)
            .filter(|a| {
                let lowered = a.title.to_lowercase();
                HIGH_CONFIDENCE_KEYWORDS.iter().any(|k| lowered.contains(k))
                    || a.sentiment.abs() > self.high_confidence_threshold
            })
            .collect();
        hits.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        hits.truncate(HIGH_CONFIDENCE_LIMIT);
        hits
    }
}

impl Default for BreakingClassifier {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use newsgraph_core::Topic;

    use super::*;

    fn article(title: &str, sentiment: f32, minutes_ago: i64, now: DateTime<Utc>) -> Article {
        Article {
            title: title.to_string(),
            description: String::new(),
            published_at: now - Duration::minutes(minutes_ago),
            url: format!("https://example.com/{title}"),
            publisher: "Reuters".to_string(),
            category: "Business".to_string(),
            sentiment,
            topic: Topic::general(),
            places: Vec::new(),
            is_breaking: false,
            processed_at: now,
        }
    }

    #[test]
    fn breaking_by_keyword_and_sentiment() {
        let c = BreakingClassifier::default();
        assert!(c.is_breaking("BREAKING: Market crashes", -0.8));
        // Each rule alone is enough.
        assert!(c.is_breaking("BREAKING: Market crashes", 0.0));
        assert!(c.is_breaking("Market crashes", -0.8));
    }

    #[test]
    fn threshold_is_strict() {
        let c = BreakingClassifier::default();
        assert!(!c.is_breaking("Quiet day", 0.5));
        assert!(c.is_breaking("Quiet day", 0.51));
    }

    #[test]
    fn empty_title_with_neutral_sentiment_is_not_breaking() {
        assert!(!BreakingClassifier::default().is_breaking("", 0.0));
    }

    #[test]
    fn keywords_from_settings_are_lowercased() {
        let c = BreakingClassifier::new(&["FLASH".to_string()], 0.5, 0.7);
        assert!(c.is_breaking("Flash flood", 0.0));
        assert!(!c.is_breaking("Breaking news", 0.0));
    }

    #[test]
    fn high_confidence_view_filters_orders_and_limits() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut articles = vec![
            article("Urgent: storm warning", 0.0, 30, now),
            article("Calm markets", 0.1, 10, now),
            article("Stocks plunge", -0.9, 5, now),
            article("Breaking: old story", -0.9, 90, now),
            article("Developing story", 0.6, 1, now),
        ];
        for i in 0..12 {
            articles.push(article(&format!("Alert {i}"), 0.0, 50, now));
        }

        let c = BreakingClassifier::default();
        let view = c.high_confidence_breaking(&articles, now);

        assert_eq!(view.len(), 10);
        assert_eq!(view[0].title, "Stocks plunge");
        assert_eq!(view[1].title, "Urgent: storm warning");
        assert!(view.iter().all(|a| a.title != "Breaking: old story"));
        assert!(view.iter().all(|a| a.title != "Developing story"));
        assert!(view.iter().all(|a| a.title != "Calm markets"));
    }
}
