//! Itinerary viewing session
//!
//! A [`PlannerSession`] is constructed when an itinerary view opens and
//! dropped when it closes. It owns the geocode cache, the map
//! synchronizer, and the currently displayed itinerary, replacing the
//! process-wide singleton services of earlier designs.

use crate::geocode::{GeocodeCache, LocationProvider};
use crate::map::{MapDriver, MapState, MapSynchronizer};
use crate::models::Itinerary;
use crate::TripWeaveError;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// View-controller for one itinerary viewing session
pub struct PlannerSession {
    synchronizer: MapSynchronizer,
    itinerary: Option<Itinerary>,
}

impl PlannerSession {
    /// Open a session against the given map driver and location provider
    #[must_use]
    pub fn new(driver: Arc<dyn MapDriver>, provider: Arc<dyn LocationProvider>) -> Self {
        let cache = Arc::new(tokio::sync::Mutex::new(GeocodeCache::new()));
        Self {
            synchronizer: MapSynchronizer::new(driver, provider, cache),
            itinerary: None,
        }
    }

    /// Hand a freshly planned itinerary to the view layer. Supersedes any
    /// previously displayed itinerary; the geocode cache is kept for the
    /// session.
    pub fn set_itinerary(&mut self, itinerary: Itinerary) {
        info!(
            id = %itinerary.id,
            days = itinerary.days.len(),
            "Displaying itinerary"
        );
        self.itinerary = Some(itinerary);
    }

    /// The currently displayed itinerary, if any
    #[must_use]
    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    /// Current state of the map container
    #[must_use]
    pub fn map_state(&self) -> MapState {
        self.synchronizer.state()
    }

    /// Select a day by 0-based index and render it on the map
    pub async fn select_day(&self, index: usize) -> Result<()> {
        let day = self
            .itinerary
            .as_ref()
            .and_then(|itinerary| itinerary.days.get(index))
            .ok_or_else(|| TripWeaveError::validation(format!("No day at index {index}")))?;

        self.synchronizer.select_day(day).await;
        Ok(())
    }

    /// Focus the map on one activity of one day without re-rendering
    pub async fn focus_activity(&self, day_index: usize, activity_index: usize) -> Result<()> {
        let activity = self
            .itinerary
            .as_ref()
            .and_then(|itinerary| itinerary.days.get(day_index))
            .and_then(|day| day.activities.get(activity_index))
            .ok_or_else(|| {
                TripWeaveError::validation(format!(
                    "No activity at day {day_index}, index {activity_index}"
                ))
            })?;

        self.synchronizer.focus(activity).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, ItineraryDay, ResolvedLocation};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct NullDriver {
        centers: Mutex<Vec<(f64, f64)>>,
    }

    impl MapDriver for NullDriver {
        fn show_loading(&self) {}
        fn hide_loading(&self) {}
        fn clear_all(&self) {}
        fn place_marker(&self, _number: u32, _location: &ResolvedLocation) {}
        fn draw_route(&self, _path: &[(f64, f64)]) {}
        fn fit_bounds(&self, _points: &[(f64, f64)]) {}
        fn set_center(&self, latitude: f64, longitude: f64, _zoom: u8) {
            self.centers.lock().unwrap().push((latitude, longitude));
        }
        fn show_placeholder(&self, _latitude: f64, _longitude: f64) {}
    }

    struct FixedProvider;

    #[async_trait]
    impl LocationProvider for FixedProvider {
        async fn search(&self, name: &str) -> anyhow::Result<Vec<ResolvedLocation>> {
            Ok(vec![ResolvedLocation::new(name, 31.2363, 121.4903)])
        }
    }

    fn itinerary() -> Itinerary {
        Itinerary {
            id: "itinerary_1".to_string(),
            title: "Shanghai Travel Plan".to_string(),
            destination: "Shanghai".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
            budget: 2000.0,
            estimated_cost: 1800.0,
            days: vec![ItineraryDay {
                day: 1,
                date: "2025-11-10".to_string(),
                activities: vec![Activity {
                    time: "09:00".to_string(),
                    title: "The Bund".to_string(),
                    description: "Riverside promenade".to_string(),
                    location: "外滩".to_string(),
                    duration: "2 hours".to_string(),
                    cost: None,
                }],
            }],
        }
    }

    fn session() -> PlannerSession {
        PlannerSession::new(
            Arc::new(NullDriver {
                centers: Mutex::new(Vec::new()),
            }),
            Arc::new(FixedProvider),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_day_requires_an_itinerary() {
        let session = session();
        assert!(session.itinerary().is_none());
        assert!(session.select_day(0).await.is_err());
        assert_eq!(session.map_state(), MapState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_day_renders_and_reaches_rendered() {
        let mut session = session();
        session.set_itinerary(itinerary());

        session.select_day(0).await.unwrap();
        assert_eq!(session.map_state(), MapState::Rendered);

        assert!(session.select_day(5).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_activity_bounds_checked() {
        let mut session = session();
        session.set_itinerary(itinerary());

        assert!(session.focus_activity(0, 0).await.is_ok());
        assert!(session.focus_activity(0, 3).await.is_err());
        assert!(session.focus_activity(2, 0).await.is_err());
    }
}
