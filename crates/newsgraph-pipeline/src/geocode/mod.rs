//! Place-name geocoding with a per-run cache, request spacing, timeouts and
//! retries.
//!
//! [`CachedGeocoder::resolve`] never fails: a place that cannot be resolved
//! for any reason is `None`, and the caller drops it together with its name.

mod gate;
mod nominatim;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use newsgraph_core::{AppConfig, GeoPoint};

use crate::error::FetchError;
use crate::retry::retry_with_backoff;

pub use gate::RequestGate;
pub use nominatim::NominatimGeocoder;

/// A geocoding service.
#[async_trait]
pub trait GeocodeBackend: Send + Sync {
    /// `Ok(None)` is a definite miss: the service answered and knows no such
    /// place.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for transport, status or body failures.
    async fn lookup(&self, place: &str) -> Result<Option<GeoPoint>, FetchError>;
}

/// Timeout, spacing and retry knobs for [`CachedGeocoder`].
#[derive(Debug, Clone, Copy)]
pub struct GeocodePolicy {
    pub timeout: Duration,
    pub min_interval: Duration,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl GeocodePolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.geocoder_timeout_secs),
            min_interval: Duration::from_millis(config.geocoder_min_interval_ms),
            max_retries: config.geocoder_max_retries,
            backoff_base_ms: config.geocoder_backoff_base_ms,
        }
    }
}

impl Default for GeocodePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            min_interval: Duration::from_millis(1000),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

/// Lookup counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeocodeStats {
    /// Every `resolve` call, cached or not.
    pub lookups: usize,
    pub cache_hits: usize,
    /// Definite misses returned by the backend.
    pub not_found: usize,
    /// Lookups that degraded to `None` after retries or a permanent error.
    pub failures: usize,
}

/// Wraps a [`GeocodeBackend`] with the run-scoped cache and request gate.
///
/// Build one per run; the cache goes away with it.
///
/// Hits and definite misses are cached under the normalized place name;
/// failed lookups are not, so a later mention may still resolve. Concurrent
/// lookups of one key are serialized, so only the first reaches the backend.
pub struct CachedGeocoder {
    backend: Arc<dyn GeocodeBackend>,
    policy: GeocodePolicy,
    gate: RequestGate,
    cache: RwLock<HashMap<String, Option<GeoPoint>>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    lookups: AtomicUsize,
    cache_hits: AtomicUsize,
    not_found: AtomicUsize,
    failures: AtomicUsize,
}

impl CachedGeocoder {
    #[must_use]
    pub fn new(backend: Arc<dyn GeocodeBackend>, policy: GeocodePolicy) -> Self {
        Self {
            backend,
            gate: RequestGate::new(policy.min_interval),
            policy,
            cache: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            not_found: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Resolve `place` to a coordinate, or `None` if it cannot be resolved.
    pub async fn resolve(&self, place: &str) -> Option<GeoPoint> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let key = normalize_place(place);
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self.cached(&key, place).await {
            return cached;
        }

        let key_lock = Arc::clone(
            self.in_flight
                .lock()
                .await
                .entry(key.clone())
                .or_default(),
        );
        let _guard = key_lock.lock().await;
        // Another task may have resolved this key while we waited.
        if let Some(cached) = self.cached(&key, place).await {
            return cached;
        }

        let timeout = self.policy.timeout;
        let result = retry_with_backoff(
            self.policy.max_retries,
            self.policy.backoff_base_ms,
            || async move {
                self.gate.wait_for_slot().await;
                tokio::time::timeout(timeout, self.backend.lookup(place))
                    .await
                    .unwrap_or(Err(FetchError::Timeout {
                        service: "geocoder",
                        secs: timeout.as_secs(),
                    }))
            },
        )
        .await;

        match result {
            Ok(point) => {
                if point.is_none() {
                    self.not_found.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(place, "geocoder found no match");
                }
                self.cache.write().await.insert(key, point);
                point
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(place, error = %e, "geocoding failed, dropping location");
                None
            }
        }
    }

    async fn cached(&self, key: &str, place: &str) -> Option<Option<GeoPoint>> {
        let cached = self.cache.read().await.get(key).copied()?;
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(place, "geocode cache hit");
        Some(cached)
    }

    #[must_use]
    pub fn stats(&self) -> GeocodeStats {
        GeocodeStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Cache key: trimmed, inner whitespace collapsed, lower-cased.
#[must_use]
pub fn normalize_place(place: &str) -> String {
    place
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
