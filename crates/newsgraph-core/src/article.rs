use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publisher recorded when the source does not name one.
pub const UNKNOWN_PUBLISHER: &str = "Unknown";

/// Title recorded when the source item has none.
pub const UNTITLED: &str = "No Title";

/// Label shared by the unclassified topic bucket and the default category.
pub const GENERAL_LABEL: &str = "General";

/// A candidate article exactly as an article source returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub publisher: String,
}

/// An article after ingest: source fields normalized, category attached.
///
/// These fields are fixed for the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedArticle {
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub publisher: String,
    pub category: String,
}

impl IngestedArticle {
    /// Normalize a raw source item.
    ///
    /// Blank titles become `"No Title"`, blank publishers `"Unknown"`, and a
    /// missing publish time falls back to `fallback_published_at` (the run
    /// timestamp).
    #[must_use]
    pub fn from_raw(
        raw: RawArticle,
        category: &str,
        fallback_published_at: DateTime<Utc>,
    ) -> Self {
        let title = if raw.title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            raw.title.trim().to_string()
        };
        let publisher = if raw.publisher.trim().is_empty() {
            UNKNOWN_PUBLISHER.to_string()
        } else {
            raw.publisher.trim().to_string()
        };

        Self {
            title,
            description: raw.description.trim().to_string(),
            published_at: raw.published_at.unwrap_or(fallback_published_at),
            url: raw.url.trim().to_string(),
            publisher,
            category: category.to_string(),
        }
    }

    /// Text the location extractor reads: title followed by description.
    #[must_use]
    pub fn location_text(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.description)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `(lat, lon)` tuple, the shape both sinks store.
    #[must_use]
    pub fn as_tuple(self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// A place mention paired with its resolved coordinate.
///
/// Articles keep locations and coordinates together in one sequence of
/// `Place`s; parallel arrays only exist at the sink boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub id: i32,
    pub label: String,
}

impl Topic {
    pub const UNCLASSIFIED_ID: i32 = -1;

    #[must_use]
    pub fn new(id: i32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// The `(-1, "General")` bucket for text no rule matched.
    #[must_use]
    pub fn general() -> Self {
        Self::new(Self::UNCLASSIFIED_ID, GENERAL_LABEL)
    }

    #[must_use]
    pub fn is_unclassified(&self) -> bool {
        self.id == Self::UNCLASSIFIED_ID
    }
}

/// A fully enriched article, ready for the sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub publisher: String,
    pub category: String,
    pub sentiment: f32,
    pub topic: Topic,
    pub places: Vec<Place>,
    pub is_breaking: bool,
    pub processed_at: DateTime<Utc>,
}

impl Article {
    /// Place names in extraction order. Always the same length as
    /// [`Article::coordinates`].
    #[must_use]
    pub fn locations(&self) -> Vec<String> {
        self.places.iter().map(|p| p.name.clone()).collect()
    }

    #[must_use]
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.places.iter().map(|p| p.point.as_tuple()).collect()
    }
}

/// One run's enriched articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub run_id: Uuid,
    pub run_at: DateTime<Utc>,
    /// Categories requested for this run, in request order.
    pub categories: Vec<String>,
    pub articles: Vec<Article>,
}

impl Batch {
    #[must_use]
    pub fn new(run_at: DateTime<Utc>, categories: Vec<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            run_at,
            categories,
            articles: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
