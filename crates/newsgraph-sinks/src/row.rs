//! Sink-boundary row shape shared by both stores.
//!
//! Articles carry their locations as paired `Place`s; rows flatten them into
//! the parallel `locations`/`coordinates` arrays both stores expect. Because
//! rows can also come back out of the columnar store (graph backfill), the
//! pairing is re-checked here rather than trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use newsgraph_core::article::{GENERAL_LABEL, UNKNOWN_PUBLISHER};
use newsgraph_core::{Article, Batch, Topic};

/// One article as written to the sinks. Field order matches the columnar
/// table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "clickhouse_datetime")]
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sentiment: f32,
    #[serde(with = "clickhouse_datetime")]
    pub processed_at: DateTime<Utc>,
    #[serde(default = "unclassified_id")]
    pub topic_id: i32,
    #[serde(default)]
    pub topic_label: String,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub coordinates: Vec<(f64, f64)>,
    #[serde(default)]
    pub is_breaking: bool,
}

fn unclassified_id() -> i32 {
    Topic::UNCLASSIFIED_ID
}

impl ArticleRow {
    #[must_use]
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.description.clone(),
            published_at: article.published_at,
            url: article.url.clone(),
            publisher: article.publisher.clone(),
            category: article.category.clone(),
            sentiment: article.sentiment,
            processed_at: article.processed_at,
            topic_id: article.topic.id,
            topic_label: article.topic.label.clone(),
            locations: article.locations(),
            coordinates: article.coordinates(),
            is_breaking: article.is_breaking,
        }
    }

    /// Replace blank scalar fields with the values the stores expect.
    ///
    /// Text fields are trimmed; publisher falls back to `"Unknown"`, category
    /// and topic label to `"General"`, content to the description. A
    /// non-finite sentiment becomes `0.0`.
    pub fn apply_defaults(&mut self) {
        for field in [
            &mut self.title,
            &mut self.description,
            &mut self.content,
            &mut self.url,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }

        if self.publisher.trim().is_empty() {
            self.publisher = UNKNOWN_PUBLISHER.to_string();
        }
        if self.category.trim().is_empty() {
            self.category = GENERAL_LABEL.to_string();
        }
        if self.topic_label.trim().is_empty() {
            self.topic_label = GENERAL_LABEL.to_string();
        }
        if self.content.is_empty() {
            self.content.clone_from(&self.description);
        }
        if !self.sentiment.is_finite() {
            self.sentiment = 0.0;
        }
    }

    /// Enforce that `locations[i]` and `coordinates[i]` are paired.
    ///
    /// On a length mismatch both arrays are truncated to the shorter length
    /// and the violation is logged at error level. Returns `true` if the row
    /// was repaired.
    pub fn enforce_pairing(&mut self) -> bool {
        let locations = self.locations.len();
        let coordinates = self.coordinates.len();
        if locations == coordinates {
            return false;
        }

        tracing::error!(
            url = %self.url,
            locations,
            coordinates,
            "location/coordinate arrays out of sync, truncating to shorter length"
        );
        let keep = locations.min(coordinates);
        self.locations.truncate(keep);
        self.coordinates.truncate(keep);
        true
    }
}

/// Rows ready for writing plus how many needed a pairing repair.
#[derive(Debug, Clone, Default)]
pub struct PreparedRows {
    pub rows: Vec<ArticleRow>,
    pub repaired: usize,
}

/// Flatten a batch into sink rows, applying defaults and the pairing check.
#[must_use]
pub fn prepare_rows(batch: &Batch) -> PreparedRows {
    repair_rows(batch.articles.iter().map(ArticleRow::from_article).collect())
}

/// Apply defaults and the pairing check to rows from any origin.
#[must_use]
pub fn repair_rows(mut rows: Vec<ArticleRow>) -> PreparedRows {
    let mut repaired = 0;
    for row in &mut rows {
        row.apply_defaults();
        if row.enforce_pairing() {
            repaired += 1;
        }
    }
    PreparedRows { rows, repaired }
}

/// `DateTime` in the `YYYY-MM-DD hh:mm:ss` form the columnar store reads and
/// writes in JSON formats.
pub(crate) mod clickhouse_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub(crate) fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use newsgraph_core::{GeoPoint, Place};

    use super::*;

    fn article() -> Article {
        Article {
            title: "Paris and Lagos discuss trade".to_string(),
            description: "Officials met.".to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap(),
            url: "https://example.com/trade".to_string(),
            publisher: "Reuters".to_string(),
            category: "Business".to_string(),
            sentiment: 0.1,
            topic: Topic::new(1, "Business"),
            places: vec![Place {
                name: "Paris".to_string(),
                point: GeoPoint::new(48.85, 2.35),
            }],
            is_breaking: false,
            processed_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn from_article_flattens_places_and_copies_content() {
        let row = ArticleRow::from_article(&article());
        assert_eq!(row.locations, vec!["Paris"]);
        assert_eq!(row.coordinates, vec![(48.85, 2.35)]);
        assert_eq!(row.content, "Officials met.");
        assert_eq!(row.topic_id, 1);
    }

    #[test]
    fn apply_defaults_fills_blank_scalars() {
        let mut row = ArticleRow::from_article(&article());
        row.publisher = "  ".to_string();
        row.category = String::new();
        row.topic_label = String::new();
        row.content = String::new();
        row.sentiment = f32::NAN;
        row.apply_defaults();
        assert_eq!(row.publisher, "Unknown");
        assert_eq!(row.category, "General");
        assert_eq!(row.topic_label, "General");
        assert_eq!(row.content, "Officials met.");
        assert!(row.sentiment.abs() < f32::EPSILON);
    }

    #[test]
    fn enforce_pairing_truncates_to_shorter_length() {
        let mut row = ArticleRow::from_article(&article());
        row.locations = vec!["Paris".into(), "Lagos".into(), "Lima".into()];
        row.coordinates = vec![(48.85, 2.35)];
        assert!(row.enforce_pairing());
        assert_eq!(row.locations, vec!["Paris"]);
        assert_eq!(row.coordinates, vec![(48.85, 2.35)]);
    }

    #[test]
    fn enforce_pairing_leaves_paired_rows_alone() {
        let mut row = ArticleRow::from_article(&article());
        assert!(!row.enforce_pairing());
        assert_eq!(row.locations.len(), 1);
    }

    #[test]
    fn repair_rows_counts_repairs() {
        let good = ArticleRow::from_article(&article());
        let mut bad = good.clone();
        bad.coordinates.clear();
        let prepared = repair_rows(vec![good, bad]);
        assert_eq!(prepared.repaired, 1);
        assert!(prepared.rows[1].locations.is_empty());
    }

    #[test]
    fn row_serializes_in_columnar_datetime_format() {
        let row = ArticleRow::from_article(&article());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["published_at"], "2026-03-01 07:30:00");
        assert_eq!(json["coordinates"][0][0], 48.85);
    }

    #[test]
    fn row_parses_columnar_output_with_missing_optional_fields() {
        let line = r#"{"title":"t","published_at":"2026-03-01 07:30:00","processed_at":"2026-03-01 08:00:00","url":"u","locations":["Paris"],"coordinates":[[48.85,2.35]]}"#;
        let row: ArticleRow = serde_json::from_str(line).unwrap();
        assert_eq!(row.topic_id, -1);
        assert_eq!(row.coordinates, vec![(48.85, 2.35)]);
        assert!(!row.is_breaking);
    }
}
