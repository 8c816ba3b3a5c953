//! `TripWeave` - AI-assisted multi-day travel itinerary planning
//!
//! This library provides the core functionality for progressive
//! interpretation of streamed itinerary completions, best-effort
//! finalization of malformed payloads, and map synchronization for the
//! selected day.

pub mod config;
pub mod error;
pub mod finalize;
pub mod geocode;
pub mod map;
pub mod models;
pub mod planner;
pub mod session;
pub mod stream;

// Re-export core types for public API
pub use config::{GenerativeConfig, MapConfig, TripWeaveConfig};
pub use error::TripWeaveError;
pub use finalize::{fallback_days, finalize};
pub use geocode::{DEFAULT_COORDINATE, GeocodeCache, GeocodingClient, LocationProvider};
pub use map::{MapDriver, MapState, MapSynchronizer};
pub use models::{
    Activity, Itinerary, ItineraryDay, ItineraryRequest, Preference, ResolvedLocation,
};
pub use planner::ItineraryPlanner;
pub use session::PlannerSession;
pub use stream::{StreamInterpreter, StreamState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripWeaveError>;
