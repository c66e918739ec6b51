//! Nominatim (OpenStreetMap) search backend.

use async_trait::async_trait;
use serde::Deserialize;

use newsgraph_core::GeoPoint;

use super::GeocodeBackend;
use crate::error::FetchError;

const SERVICE: &str = "nominatim";

/// `GET {base}/search?q=..&format=json&limit=1` with a descriptive
/// User-Agent, as the Nominatim usage policy requires.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodeBackend for NominatimGeocoder {
    async fn lookup(&self, place: &str) -> Result<Option<GeoPoint>, FetchError> {
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let results: Vec<SearchResult> =
            serde_json::from_str(&body).map_err(|source| FetchError::Deserialize {
                context: format!("{SERVICE} search for '{place}'"),
                source,
            })?;

        let Some(first) = results.into_iter().next() else {
            return Ok(None);
        };
        match (first.lat.parse::<f64>(), first.lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => {
                Ok(Some(GeoPoint::new(lat, lon)))
            }
            _ => {
                tracing::warn!(place, lat = %first.lat, lon = %first.lon, "unparseable coordinates from geocoder");
                Ok(None)
            }
        }
    }
}
