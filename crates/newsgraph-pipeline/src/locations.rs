//! Place-name extraction.

use regex::Regex;

use crate::error::EnrichError;

/// Finds place mentions in free text.
pub trait LocationExtractor: Send + Sync {
    /// Place names in mention order, duplicates preserved.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Extraction`] if the text cannot be processed.
    fn extract(&self, text: &str) -> Result<Vec<String>, EnrichError>;
}

/// Built-in gazetteer: countries, major cities and regions that routinely
/// appear in English-language headlines.
pub const DEFAULT_GAZETTEER: &[&str] = &[
    // Cities
    "Amsterdam", "Athens", "Atlanta", "Bangkok", "Barcelona", "Beijing", "Beirut", "Berlin",
    "Bogota", "Boston", "Brussels", "Buenos Aires", "Cairo", "Cape Town", "Chicago",
    "Copenhagen", "Dallas", "Delhi", "Dhaka", "Dubai", "Dublin", "Geneva", "Hong Kong",
    "Houston", "Istanbul", "Jakarta", "Jerusalem", "Johannesburg", "Kabul", "Karachi", "Kyiv",
    "Lagos", "Lima", "Lisbon", "London", "Los Angeles", "Madrid", "Manila", "Melbourne",
    "Mexico City", "Miami", "Milan", "Moscow", "Mumbai", "Nairobi", "New Delhi", "New York",
    "Oslo", "Ottawa", "Paris", "Prague", "Rio de Janeiro", "Rome", "San Francisco", "Santiago",
    "Sao Paulo", "Seattle", "Seoul", "Shanghai", "Singapore", "Stockholm", "Sydney", "Taipei",
    "Tehran", "Tel Aviv", "Tokyo", "Toronto", "Vancouver", "Vienna", "Warsaw", "Washington",
    "Zurich",
    // Countries
    "Afghanistan", "Argentina", "Australia", "Brazil", "Canada", "Chile", "China", "Colombia",
    "Egypt", "Ethiopia", "France", "Germany", "Ghana", "Greece", "India", "Indonesia", "Iran",
    "Iraq", "Ireland", "Israel", "Italy", "Japan", "Kenya", "Mexico", "Netherlands",
    "New Zealand", "Nigeria", "North Korea", "Norway", "Pakistan", "Peru", "Philippines",
    "Poland", "Portugal", "Russia", "Saudi Arabia", "South Africa", "South Korea", "Spain",
    "Sweden", "Switzerland", "Syria", "Taiwan", "Thailand", "Turkey", "Ukraine",
    "United Kingdom", "United States", "Venezuela", "Vietnam",
    // Regions and states
    "California", "Florida", "Gaza", "Texas", "West Bank",
];

/// Whole-word, case-sensitive gazetteer matcher capped at `max_mentions`.
///
/// Alternatives are tried longest first, so "New York" wins over "York" and
/// "Mexico City" over "Mexico" at the same position.
#[derive(Debug, Clone)]
pub struct GazetteerExtractor {
    pattern: Regex,
    max_mentions: usize,
}

impl GazetteerExtractor {
    /// # Errors
    ///
    /// Returns [`EnrichError::Extraction`] if the gazetteer is empty or the
    /// combined pattern cannot be compiled.
    pub fn new<S: AsRef<str>>(names: &[S], max_mentions: usize) -> Result<Self, EnrichError> {
        let mut names: Vec<&str> = names
            .iter()
            .map(|n| n.as_ref().trim())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(EnrichError::Extraction("gazetteer is empty".to_string()));
        }
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();

        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b(?:{alternation})\b"))
            .map_err(|e| EnrichError::Extraction(e.to_string()))?;

        Ok(Self {
            pattern,
            max_mentions,
        })
    }

    /// Extractor over [`DEFAULT_GAZETTEER`].
    ///
    /// # Errors
    ///
    /// See [`GazetteerExtractor::new`].
    pub fn with_default_gazetteer(max_mentions: usize) -> Result<Self, EnrichError> {
        Self::new(DEFAULT_GAZETTEER, max_mentions)
    }
}

impl LocationExtractor for GazetteerExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, EnrichError> {
        Ok(self
            .pattern
            .find_iter(text)
            .take(self.max_mentions)
            .map(|m| m.as_str().to_string())
            .collect())
    }
}
