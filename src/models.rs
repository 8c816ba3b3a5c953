//! Core data models for itinerary planning
//!
//! Wire field names follow the JSON schema the generative service is asked
//! to produce: `estimatedCost`, `itinerary`, and the per-activity
//! `time`/`title`/`description`/`location`/`duration`/`cost` fields.

use crate::TripWeaveError;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated travel preference tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Food,
    Culture,
    Nature,
    Shopping,
    HistoricalSites,
    Entertainment,
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Preference::Food => "food",
            Preference::Culture => "culture",
            Preference::Nature => "natural scenery",
            Preference::Shopping => "shopping",
            Preference::HistoricalSites => "historical sites",
            Preference::Entertainment => "entertainment",
        };
        write!(f, "{label}")
    }
}

/// A planning request as submitted by the user. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryRequest {
    /// Destination city or region
    pub destination: String,
    /// First day of the trip
    pub start_date: NaiveDate,
    /// Last day of the trip (inclusive)
    pub end_date: NaiveDate,
    /// Total budget, non-negative
    pub budget: f64,
    /// Number of travelers, at least one
    pub travelers: u32,
    /// Preference tags guiding activity selection
    pub preferences: Vec<Preference>,
    /// Optional free-text special requests
    pub special_requests: Option<String>,
}

impl ItineraryRequest {
    /// Build a validated request
    pub fn new(
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
        travelers: u32,
        preferences: Vec<Preference>,
        special_requests: Option<String>,
    ) -> Result<Self> {
        let destination = destination.into();

        if destination.trim().is_empty() {
            return Err(TripWeaveError::validation("Destination cannot be empty").into());
        }
        if end_date < start_date {
            return Err(
                TripWeaveError::validation("End date must not be before start date").into(),
            );
        }
        if budget < 0.0 {
            return Err(TripWeaveError::validation("Budget must be non-negative").into());
        }
        if travelers == 0 {
            return Err(TripWeaveError::validation("At least one traveler is required").into());
        }

        Ok(Self {
            destination,
            start_date,
            end_date,
            budget,
            travelers,
            preferences,
            special_requests,
        })
    }

    /// Number of calendar days covered by the trip, inclusive of both ends
    #[must_use]
    pub fn trip_days(&self) -> u32 {
        (self.end_date - self.start_date).num_days() as u32 + 1
    }
}

/// One scheduled activity within a day. Has no identity beyond its
/// position in the day's activity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Time of day, free text ("09:00")
    pub time: String,
    /// Activity title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Place name, resolved against the geocode cache when plotted
    pub location: String,
    /// Duration, free text ("2 hours")
    pub duration: String,
    /// Optional cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// One day of an itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// 1-based day index
    pub day: u32,
    /// Calendar date as delivered on the wire ("YYYY-MM-DD")
    pub date: String,
    /// Activities in scheduled order
    pub activities: Vec<Activity>,
}

/// A complete planned itinerary. Created once per successful planning
/// request; immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    pub estimated_cost: f64,
    /// Day-by-day schedule; wire name matches the generative schema
    #[serde(rename = "itinerary")]
    pub days: Vec<ItineraryDay>,
}

impl Itinerary {
    /// Invariant check: day indices strictly increasing, dates
    /// non-decreasing across the sequence.
    #[must_use]
    pub fn days_in_order(&self) -> bool {
        self.days.windows(2).all(|pair| {
            pair[1].day > pair[0].day && pair[1].date.as_str() >= pair[0].date.as_str()
        })
    }
}

/// A place name resolved to geographic coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Place name as returned by the provider
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Optional street address
    pub address: Option<String>,
    /// Display title attached when plotted as a marker
    pub label: Option<String>,
    /// Display description attached when plotted as a marker
    pub description: Option<String>,
}

impl ResolvedLocation {
    /// Create a bare resolved location without display metadata
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            address: None,
            label: None,
            description: None,
        }
    }

    /// Attach marker display metadata from an activity
    #[must_use]
    pub fn with_activity(mut self, activity: &Activity) -> Self {
        self.label = Some(activity.title.clone());
        self.description = Some(activity.description.clone());
        self
    }
}
