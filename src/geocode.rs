//! Place-name resolution and the session geocode cache
//!
//! The cache maps exact place names to resolved coordinates for the
//! lifetime of one itinerary viewing session. A miss issues a single
//! provider lookup and stores the first candidate; a failed or empty
//! lookup stores nothing, and the caller falls back to
//! [`DEFAULT_COORDINATE`].

use crate::config::MapConfig;
use crate::models::ResolvedLocation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fixed fallback coordinate used whenever resolution yields no candidates
/// or the provider is unavailable. Not configurable at runtime.
pub const DEFAULT_COORDINATE: (f64, f64) = (39.9042, 116.4074);

/// External place search collaborator. The first candidate returned is
/// taken as authoritative.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn search(&self, name: &str) -> Result<Vec<ResolvedLocation>>;
}

/// Session-scoped geocode cache, keyed by exact (case-sensitive) name.
/// Entries never expire within a session.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, ResolvedLocation>,
}

impl GeocodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a place name. Cache hits return immediately with no network
    /// access; misses issue one provider lookup and cache the first
    /// candidate. Empty results and provider errors are absorbed and
    /// return `None` without negative caching.
    pub async fn resolve(
        &mut self,
        name: &str,
        provider: &dyn LocationProvider,
    ) -> Option<ResolvedLocation> {
        if let Some(hit) = self.entries.get(name) {
            debug!("Geocode cache hit for '{name}'");
            return Some(hit.clone());
        }

        let candidates = match provider.search(name).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Place search failed for '{name}': {e}");
                return None;
            }
        };

        let Some(first) = candidates.into_iter().next() else {
            debug!("No candidates found for '{name}'");
            return None;
        };

        // Single atomic insert keyed by the exact input name; readers
        // never observe a partially written entry.
        self.entries.insert(name.to_string(), first.clone());
        Some(first)
    }
}

/// Production place search client
pub struct GeocodingClient {
    client: reqwest::Client,
    config: MapConfig,
}

/// Place search response from the geocoding service
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

impl GeocodingClient {
    /// Create a new place search client
    pub fn new(config: MapConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent("TripWeave/0.1.0")
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LocationProvider for GeocodingClient {
    #[instrument(skip(self), fields(location = name))]
    async fn search(&self, name: &str) -> Result<Vec<ResolvedLocation>> {
        info!("Searching place: '{name}'");

        let mut url = format!(
            "{}?name={}&count=5&format=json",
            self.config.search_base_url,
            urlencoding::encode(name)
        );
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&key={}", urlencoding::encode(key)));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Place search request failed for '{name}'"))?;

        let search_response: SearchResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse place search response")?;

        let locations: Vec<ResolvedLocation> = search_response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|result| {
                let address = match (result.admin1, result.country) {
                    (Some(admin), Some(country)) => Some(format!("{admin}, {country}")),
                    (Some(admin), None) => Some(admin),
                    (None, Some(country)) => Some(country),
                    (None, None) => None,
                };
                ResolvedLocation {
                    name: result.name,
                    latitude: result.latitude,
                    longitude: result.longitude,
                    address,
                    label: None,
                    description: None,
                }
            })
            .collect();

        if locations.is_empty() {
            warn!("No results found for place '{name}'");
        } else {
            debug!("Found {} candidates for '{name}'", locations.len());
        }

        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that counts lookups and serves a fixed table
    struct CountingProvider {
        lookups: AtomicUsize,
        known: HashMap<String, ResolvedLocation>,
    }

    impl CountingProvider {
        fn new(known: &[(&str, f64, f64)]) -> Self {
            Self {
                lookups: AtomicUsize::new(0),
                known: known
                    .iter()
                    .map(|(name, lat, lon)| {
                        (name.to_string(), ResolvedLocation::new(*name, *lat, *lon))
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl LocationProvider for CountingProvider {
        async fn search(&self, name: &str) -> Result<Vec<ResolvedLocation>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.known.get(name).cloned().into_iter().collect())
        }
    }

    #[tokio::test]
    async fn test_second_resolve_is_served_from_cache() {
        let provider = CountingProvider::new(&[("故宫博物院", 39.9162, 116.3972)]);
        let mut cache = GeocodeCache::new();

        let first = cache.resolve("故宫博物院", &provider).await.unwrap();
        let second = cache.resolve("故宫博物院", &provider).await.unwrap();

        assert_eq!(provider.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first.latitude, 39.9162);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_key_is_case_sensitive() {
        let provider =
            CountingProvider::new(&[("West Lake", 30.2429, 120.1447), ("west lake", 1.0, 2.0)]);
        let mut cache = GeocodeCache::new();

        cache.resolve("West Lake", &provider).await.unwrap();
        cache.resolve("west lake", &provider).await.unwrap();

        assert_eq!(provider.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_negatively_cached() {
        let provider = CountingProvider::new(&[]);
        let mut cache = GeocodeCache::new();

        assert!(cache.resolve("nowhere", &provider).await.is_none());
        assert!(cache.resolve("nowhere", &provider).await.is_none());

        // Every miss issues its own lookup; nothing is stored.
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_is_absorbed() {
        struct FailingProvider;

        #[async_trait]
        impl LocationProvider for FailingProvider {
            async fn search(&self, _name: &str) -> Result<Vec<ResolvedLocation>> {
                Err(anyhow::anyhow!("network down"))
            }
        }

        let mut cache = GeocodeCache::new();
        assert!(cache.resolve("anywhere", &FailingProvider).await.is_none());
        assert!(cache.is_empty());
    }
}
