//! Enrichment stage: sentiment, topic, places and the breaking flag.
//!
//! Every stage runs for every article. A failing optional stage leaves its
//! field at the default and is counted; it never drops the article.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use newsgraph_core::{Article, GeoPoint, IngestedArticle, Place, Topic};

use crate::breaking::BreakingClassifier;
use crate::cancel::CancelFlag;
use crate::geocode::CachedGeocoder;
use crate::locations::LocationExtractor;
use crate::scorer::lexicon_score;
use crate::topics::TopicModel;

/// How many articles had each optional stage fall back to its default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DegradedStages {
    pub topic: usize,
    pub location_extraction: usize,
    /// Extracted places dropped because they could not be geocoded.
    pub unresolved_places: usize,
}

impl DegradedStages {
    fn add(&mut self, other: Self) {
        self.topic += other.topic;
        self.location_extraction += other.location_extraction;
        self.unresolved_places += other.unresolved_places;
    }
}

#[derive(Debug, Default)]
pub struct EnrichOutcome {
    /// Enriched articles in input order.
    pub articles: Vec<Article>,
    pub degraded: DegradedStages,
    /// Set when the cancel flag stopped enrichment before every article ran.
    pub cancelled: bool,
}

/// The per-run stage set.
pub struct Enricher<'a> {
    pub topic_model: &'a dyn TopicModel,
    pub extractor: &'a dyn LocationExtractor,
    pub geocoder: &'a CachedGeocoder,
    pub breaking: &'a BreakingClassifier,
}

impl Enricher<'_> {
    /// Enrich `articles` with up to `workers` in flight, keeping input order.
    ///
    /// The cancel flag is checked as each article is about to start; an
    /// article already started always finishes.
    pub async fn enrich_all(
        &self,
        articles: Vec<IngestedArticle>,
        workers: usize,
        cancel: &CancelFlag,
    ) -> EnrichOutcome {
        let total = articles.len();
        let results: Vec<Option<(Article, DegradedStages)>> = stream::iter(articles)
            .map(|article| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.enrich_one(article).await)
            })
            .buffered(workers.max(1))
            .collect()
            .await;

        let mut outcome = EnrichOutcome::default();
        for (article, degraded) in results.into_iter().flatten() {
            outcome.degraded.add(degraded);
            outcome.articles.push(article);
        }
        outcome.cancelled = outcome.articles.len() < total;
        if outcome.cancelled {
            tracing::info!(
                enriched = outcome.articles.len(),
                total,
                "run cancelled during enrichment"
            );
        }
        outcome
    }

    /// Run every stage for one article.
    pub async fn enrich_one(&self, article: IngestedArticle) -> (Article, DegradedStages) {
        let mut degraded = DegradedStages::default();

        let sentiment = lexicon_score(&article.title);

        let topic = match self.topic_model.assign(&article.title) {
            Ok(topic) => topic,
            Err(e) => {
                tracing::warn!(url = %article.url, error = %e, "topic assignment failed, using General");
                degraded.topic += 1;
                Topic::general()
            }
        };

        let names = match self.extractor.extract(&article.location_text()) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(url = %article.url, error = %e, "location extraction failed");
                degraded.location_extraction += 1;
                Vec::new()
            }
        };
        let extracted = names.len();
        let points =
            futures::future::join_all(names.iter().map(|name| self.geocoder.resolve(name))).await;
        let places = pair_places(names, points);
        degraded.unresolved_places = extracted - places.len();

        let is_breaking = self.breaking.is_breaking(&article.title, sentiment);

        tracing::debug!(
            url = %article.url,
            sentiment,
            topic = %topic.label,
            places = places.len(),
            is_breaking,
            "article enriched"
        );

        let enriched = Article {
            title: article.title,
            description: article.description,
            published_at: article.published_at,
            url: article.url,
            publisher: article.publisher,
            category: article.category,
            sentiment,
            topic,
            places,
            is_breaking,
            processed_at: Utc::now(),
        };
        (enriched, degraded)
    }
}

/// Pair each extracted name with its resolution, by index, dropping
/// unresolved pairs together and keeping the survivors in extraction order.
#[must_use]
pub fn pair_places(names: Vec<String>, points: Vec<Option<GeoPoint>>) -> Vec<Place> {
    names
        .into_iter()
        .zip(points)
        .filter_map(|(name, point)| point.map(|point| Place { name, point }))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use newsgraph_core::default_topic_rules;

    use super::*;
    use crate::error::{EnrichError, FetchError};
    use crate::geocode::{GeocodeBackend, GeocodePolicy};
    use crate::locations::GazetteerExtractor;
    use crate::topics::RuleTopicClassifier;

    /// Resolves Paris and Berlin; everything else is a transient failure.
    struct TwoCities;

    #[async_trait]
    impl GeocodeBackend for TwoCities {
        async fn lookup(&self, place: &str) -> Result<Option<GeoPoint>, FetchError> {
            match place {
                "Paris" => Ok(Some(GeoPoint::new(48.85, 2.35))),
                "Berlin" => Ok(Some(GeoPoint::new(52.52, 13.40))),
                _ => Err(FetchError::Status {
                    service: "test",
                    status: 503,
                }),
            }
        }
    }

    struct BrokenTopics;

    impl TopicModel for BrokenTopics {
        fn assign(&self, _text: &str) -> Result<Topic, EnrichError> {
            Err(EnrichError::Topic("model offline".to_string()))
        }
    }

    fn geocoder() -> CachedGeocoder {
        CachedGeocoder::new(
            Arc::new(TwoCities),
            GeocodePolicy {
                min_interval: std::time::Duration::ZERO,
                backoff_base_ms: 0,
                ..GeocodePolicy::default()
            },
        )
    }

    fn ingested(title: &str, description: &str) -> IngestedArticle {
        IngestedArticle {
            title: title.to_string(),
            description: description.to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap(),
            url: format!("https://example.com/{}", title.len()),
            publisher: "Reuters".to_string(),
            category: "Business".to_string(),
        }
    }

    #[test]
    fn pair_places_drops_unresolved_in_lockstep() {
        let names = vec!["Paris".to_string(), "Lagos".to_string(), "Berlin".to_string()];
        let points = vec![
            Some(GeoPoint::new(48.85, 2.35)),
            None,
            Some(GeoPoint::new(52.52, 13.40)),
        ];
        let places = pair_places(names, points);
        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Berlin"]);
        assert_eq!(places[1].point, GeoPoint::new(52.52, 13.40));
    }

    #[tokio::test]
    async fn unresolved_location_is_dropped_with_its_name() {
        let topics = RuleTopicClassifier::new(&default_topic_rules());
        let extractor = GazetteerExtractor::with_default_gazetteer(2).unwrap();
        let geocoder = geocoder();
        let breaking = BreakingClassifier::default();
        let enricher = Enricher {
            topic_model: &topics,
            extractor: &extractor,
            geocoder: &geocoder,
            breaking: &breaking,
        };

        let (article, degraded) = enricher
            .enrich_one(ingested("Paris and Lagos discuss trade", ""))
            .await;

        assert_eq!(article.locations(), vec!["Paris"]);
        assert_eq!(article.coordinates(), vec![(48.85, 2.35)]);
        assert_eq!(degraded.unresolved_places, 1);
        assert_eq!(article.topic, Topic::general());
    }

    #[tokio::test]
    async fn failing_topic_model_degrades_to_general() {
        let extractor = GazetteerExtractor::with_default_gazetteer(2).unwrap();
        let geocoder = geocoder();
        let breaking = BreakingClassifier::default();
        let enricher = Enricher {
            topic_model: &BrokenTopics,
            extractor: &extractor,
            geocoder: &geocoder,
            breaking: &breaking,
        };

        let (article, degraded) = enricher
            .enrich_one(ingested("BREAKING: Market crashes", "Traders in Berlin react"))
            .await;

        assert_eq!(article.topic, Topic::general());
        assert_eq!(degraded.topic, 1);
        assert!(article.is_breaking);
        assert!(article.sentiment < 0.0);
        assert_eq!(article.locations(), vec!["Berlin"]);
    }

    #[tokio::test]
    async fn enrich_all_keeps_input_order() {
        let topics = RuleTopicClassifier::new(&default_topic_rules());
        let extractor = GazetteerExtractor::with_default_gazetteer(2).unwrap();
        let geocoder = geocoder();
        let breaking = BreakingClassifier::default();
        let enricher = Enricher {
            topic_model: &topics,
            extractor: &extractor,
            geocoder: &geocoder,
            breaking: &breaking,
        };

        let input: Vec<IngestedArticle> = (0..10)
            .map(|i| {
                let mut a = ingested(&format!("Story {i} from Paris"), "");
                a.url = format!("https://example.com/{i}");
                a
            })
            .collect();
        let outcome = enricher.enrich_all(input, 4, &CancelFlag::new()).await;

        assert!(!outcome.cancelled);
        let urls: Vec<String> = outcome.articles.iter().map(|a| a.url.clone()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("https://example.com/{i}")).collect();
        assert_eq!(urls, expected);
        assert!(outcome
            .articles
            .iter()
            .all(|a| a.locations().len() == a.coordinates().len()));
    }

    #[tokio::test]
    async fn cancelled_before_start_enriches_nothing() {
        let topics = RuleTopicClassifier::new(&default_topic_rules());
        let extractor = GazetteerExtractor::with_default_gazetteer(2).unwrap();
        let geocoder = geocoder();
        let breaking = BreakingClassifier::default();
        let enricher = Enricher {
            topic_model: &topics,
            extractor: &extractor,
            geocoder: &geocoder,
            breaking: &breaking,
        };
        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcome = enricher
            .enrich_all(vec![ingested("Story", "")], 4, &cancel)
            .await;
        assert!(outcome.cancelled);
        assert!(outcome.articles.is_empty());
    }
}
