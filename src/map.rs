//! Map synchronization engine
//!
//! Keeps one map container consistent with the currently selected
//! itinerary day. Rendering goes through the [`MapDriver`] capability
//! trait so the synchronization logic is independent of any concrete
//! mapping provider.
//!
//! Day selections overlap when the user clicks faster than lookups
//! resolve; every resolution batch is tagged with a monotonically
//! increasing generation and results from superseded generations are
//! discarded, never applied to a stale container.

use crate::geocode::{DEFAULT_COORDINATE, GeocodeCache, LocationProvider};
use crate::models::{Activity, ItineraryDay, ResolvedLocation};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Zoom level used when centering on a single location
const FOCUS_ZOOM: u8 = 14;

/// Delay before hiding the loading overlay, avoids a flash on fast renders
const OVERLAY_HIDE_DELAY: Duration = Duration::from_millis(300);

/// Loading-state machine per map container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Idle,
    Loading,
    Rendered,
}

/// Map-drawing capability interface provided by the mapping collaborator
pub trait MapDriver: Send + Sync {
    /// Show the loading overlay
    fn show_loading(&self);
    /// Hide the loading overlay
    fn hide_loading(&self);
    /// Remove all markers and the route line
    fn clear_all(&self);
    /// Place one numbered marker with an optional label
    fn place_marker(&self, number: u32, location: &ResolvedLocation);
    /// Draw a polyline through the given coordinates, in order
    fn draw_route(&self, path: &[(f64, f64)]);
    /// Adjust the view bounds to fit the given coordinates
    fn fit_bounds(&self, points: &[(f64, f64)]);
    /// Center the view on one coordinate
    fn set_center(&self, latitude: f64, longitude: f64, zoom: u8);
    /// Render the placeholder view centered on a coordinate
    fn show_placeholder(&self, latitude: f64, longitude: f64);
}

/// Drives marker/route rendering for the selected day
pub struct MapSynchronizer {
    driver: Arc<dyn MapDriver>,
    provider: Arc<dyn LocationProvider>,
    cache: Arc<tokio::sync::Mutex<GeocodeCache>>,
    state: Mutex<MapState>,
    generation: AtomicU64,
}

impl MapSynchronizer {
    #[must_use]
    pub fn new(
        driver: Arc<dyn MapDriver>,
        provider: Arc<dyn LocationProvider>,
        cache: Arc<tokio::sync::Mutex<GeocodeCache>>,
    ) -> Self {
        Self {
            driver,
            provider,
            cache,
            state: Mutex::new(MapState::Idle),
            generation: AtomicU64::new(0),
        }
    }

    /// Current state of the container's loading-state machine
    #[must_use]
    pub fn state(&self) -> MapState {
        *self.state.lock().expect("map state lock poisoned")
    }

    fn set_state(&self, state: MapState) {
        *self.state.lock().expect("map state lock poisoned") = state;
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// Render the given day: resolve every activity location in listed
    /// order, then place markers and the route. Unresolvable activities
    /// are skipped; the state machine always reaches `Rendered` for the
    /// winning generation, even when nothing resolves.
    pub async fn select_day(&self, day: &ItineraryDay) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(day = day.day, generation, "Rendering day selection");

        self.set_state(MapState::Loading);
        self.driver.show_loading();

        // Sequential resolution in listed order bounds outstanding
        // lookups to one.
        let mut resolved: Vec<ResolvedLocation> = Vec::new();
        for activity in &day.activities {
            let location = {
                let mut cache = self.cache.lock().await;
                cache.resolve(&activity.location, self.provider.as_ref()).await
            };

            if self.is_stale(generation) {
                debug!(generation, "Day selection superseded, discarding batch");
                return;
            }

            match location {
                Some(location) => resolved.push(location.with_activity(activity)),
                None => debug!("Skipping unresolvable activity '{}'", activity.title),
            }
        }

        if self.is_stale(generation) {
            debug!(generation, "Day selection superseded, discarding batch");
            return;
        }

        self.driver.clear_all();
        self.apply(&resolved);
        self.set_state(MapState::Rendered);

        sleep(OVERLAY_HIDE_DELAY).await;
        if !self.is_stale(generation) {
            self.driver.hide_loading();
        }
    }

    /// Apply resolved locations to the driver
    fn apply(&self, resolved: &[ResolvedLocation]) {
        match resolved {
            [] => {
                let (lat, lon) = DEFAULT_COORDINATE;
                self.driver.show_placeholder(lat, lon);
            }
            [only] => {
                self.driver.set_center(only.latitude, only.longitude, FOCUS_ZOOM);
            }
            many => {
                let points: Vec<(f64, f64)> = many
                    .iter()
                    .map(|location| (location.latitude, location.longitude))
                    .collect();
                for (i, location) in many.iter().enumerate() {
                    self.driver.place_marker(i as u32 + 1, location);
                }
                // Route follows list order, never a shortest-path reorder.
                self.driver.draw_route(&points);
                self.driver.fit_bounds(&points);
            }
        }
    }

    /// Re-center and zoom on one activity's location without altering
    /// markers, the route, or the container state.
    pub async fn focus(&self, activity: &Activity) {
        let location = {
            let mut cache = self.cache.lock().await;
            cache.resolve(&activity.location, self.provider.as_ref()).await
        };

        match location {
            Some(location) => {
                self.driver.set_center(location.latitude, location.longitude, FOCUS_ZOOM);
            }
            None => {
                let (lat, lon) = DEFAULT_COORDINATE;
                self.driver.set_center(lat, lon, FOCUS_ZOOM);
            }
        }
    }
}
