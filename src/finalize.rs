//! Itinerary finalization
//!
//! Turns the accumulated text of a (possibly malformed) completion into a
//! structured [`Itinerary`]. Three tiers, first success wins: strict parse
//! of the whole trimmed text, strict parse of the first balanced `{...}`
//! span, and a fallback itinerary built purely from the request. The caller
//! always receives a usable itinerary, never an error.

use crate::models::{Activity, Itinerary, ItineraryDay, ItineraryRequest, Preference};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

/// The payload shape the generative service is instructed to return.
/// Identity fields (`id`, `title`, destination, dates, budget) are never
/// trusted from the wire; only the cost estimate and the day schedule are.
#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    #[serde(rename = "estimatedCost")]
    estimated_cost: Option<f64>,
    #[serde(rename = "itinerary")]
    days: Option<Vec<ItineraryDay>>,
}

/// Build a structured itinerary from accumulated completion text.
#[must_use]
pub fn finalize(accumulated: &str, request: &ItineraryRequest) -> Itinerary {
    let trimmed = accumulated.trim();

    let parsed = serde_json::from_str::<GeneratedPayload>(trimmed)
        .map_err(|e| debug!("Strict parse failed: {e}"))
        .ok()
        .or_else(|| {
            let span = balanced_object_span(trimmed)?;
            serde_json::from_str::<GeneratedPayload>(span)
                .map_err(|e| debug!("Balanced-span parse failed: {e}"))
                .ok()
        });

    let (estimated_cost, days) = match parsed {
        Some(payload) => (
            payload.estimated_cost.unwrap_or(request.budget),
            // A payload that parses but carries no day schedule still gets a
            // usable plan, same as the degraded planner.
            payload.days.unwrap_or_else(|| fallback_days(request)),
        ),
        None => {
            warn!("Completion text never became valid JSON, returning fallback itinerary");
            (request.budget, Vec::new())
        }
    };

    let itinerary = from_request(request, estimated_cost, days);
    if !itinerary.days_in_order() {
        warn!("Parsed itinerary violates day ordering invariant");
    }
    itinerary
}

/// Assemble an itinerary whose identity fields come from the request
fn from_request(request: &ItineraryRequest, estimated_cost: f64, days: Vec<ItineraryDay>) -> Itinerary {
    Itinerary {
        id: format!("itinerary_{}", Utc::now().timestamp_millis()),
        title: format!("{} Travel Plan", request.destination),
        destination: request.destination.clone(),
        start_date: request.start_date,
        end_date: request.end_date,
        budget: request.budget,
        estimated_cost,
        days,
    }
}

/// Locate the first outermost balanced `{...}` span. Brace matching is
/// string- and escape-aware so braces inside JSON strings don't count.
fn balanced_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Generate placeholder days for the planner's degraded mode: one day per
/// calendar date in the request range, with preference-matched activities.
#[must_use]
pub fn fallback_days(request: &ItineraryRequest) -> Vec<ItineraryDay> {
    (0..request.trip_days())
        .map(|i| {
            let date = request.start_date + Duration::days(i64::from(i));
            ItineraryDay {
                day: i + 1,
                date: date.format("%Y-%m-%d").to_string(),
                activities: fallback_activities(&request.preferences),
            }
        })
        .collect()
}

fn fallback_activities(preferences: &[Preference]) -> Vec<Activity> {
    let mut activities = Vec::new();

    if preferences.contains(&Preference::Food) {
        activities.push(Activity {
            time: "12:00".to_string(),
            title: "Local specialty restaurant".to_string(),
            description: "Taste the local cuisine".to_string(),
            location: "City center food street".to_string(),
            duration: "1.5 hours".to_string(),
            cost: Some(150.0),
        });
    }

    if preferences.contains(&Preference::Culture) {
        activities.push(Activity {
            time: "10:00".to_string(),
            title: "Museum visit".to_string(),
            description: "Learn about local history and culture".to_string(),
            location: "City museum".to_string(),
            duration: "2 hours".to_string(),
            cost: Some(80.0),
        });
    }

    if preferences.contains(&Preference::Nature) {
        activities.push(Activity {
            time: "14:00".to_string(),
            title: "Nature park walk".to_string(),
            description: "Enjoy the natural scenery".to_string(),
            location: "City park".to_string(),
            duration: "2 hours".to_string(),
            cost: Some(0.0),
        });
    }

    if activities.is_empty() {
        activities.push(Activity {
            time: "09:00".to_string(),
            title: "City sightseeing".to_string(),
            description: "Start a day of urban exploration".to_string(),
            location: "City center".to_string(),
            duration: "1 hour".to_string(),
            cost: Some(0.0),
        });
    }

    activities
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request() -> ItineraryRequest {
        ItineraryRequest::new(
            "Beijing",
            NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 12).unwrap(),
            5000.0,
            2,
            vec![Preference::Food, Preference::Culture],
            None,
        )
        .unwrap()
    }

    const VALID: &str = r#"{"estimatedCost": 4200, "itinerary": [
        {"day": 1, "date": "2025-11-10", "activities": [
            {"time": "09:00", "title": "Tiananmen Square", "description": "d",
             "location": "Tiananmen Square", "duration": "2 hours", "cost": 0}]}]}"#;

    #[test]
    fn test_strict_parse_takes_parsed_days_and_fallback_identity() {
        let itinerary = finalize(VALID, &request());

        assert_eq!(itinerary.estimated_cost, 4200.0);
        assert_eq!(itinerary.days.len(), 1);
        assert_eq!(itinerary.days[0].activities[0].title, "Tiananmen Square");

        // Identity always comes from the request, never from the payload.
        assert_eq!(itinerary.destination, "Beijing");
        assert_eq!(itinerary.budget, 5000.0);
        assert_eq!(
            itinerary.start_date,
            NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
        );
        assert!(itinerary.title.contains("Beijing"));
    }

    #[test]
    fn test_payload_identity_fields_are_ignored() {
        let text = r#"{"destination": "Shanghai", "budget": 1, "estimatedCost": 300, "itinerary": []}"#;
        let itinerary = finalize(text, &request());
        assert_eq!(itinerary.destination, "Beijing");
        assert_eq!(itinerary.budget, 5000.0);
        assert_eq!(itinerary.estimated_cost, 300.0);
    }

    #[test]
    fn test_parsed_payload_without_day_schedule_gets_fallback_days() {
        let itinerary = finalize(r#"{"estimatedCost": 300}"#, &request());
        assert_eq!(itinerary.estimated_cost, 300.0);
        assert_eq!(itinerary.days, fallback_days(&request()));
        assert_eq!(itinerary.days.len(), 3);
    }

    #[test]
    fn test_explicit_empty_day_schedule_stays_empty() {
        let itinerary = finalize(r#"{"estimatedCost": 300, "itinerary": []}"#, &request());
        assert!(itinerary.days.is_empty());
    }

    #[test]
    fn test_balanced_span_recovers_wrapped_payload() {
        let wrapped = format!("Here is your itinerary:\n```json\n{VALID}\n```\nEnjoy!");
        let itinerary = finalize(&wrapped, &request());
        assert_eq!(itinerary.estimated_cost, 4200.0);
        assert_eq!(itinerary.days.len(), 1);
    }

    #[test]
    fn test_invalid_text_degrades_to_empty_days() {
        let itinerary = finalize("sorry, something went wrong", &request());
        assert!(itinerary.days.is_empty());
        assert_eq!(itinerary.estimated_cost, 5000.0);
        assert_eq!(itinerary.destination, "Beijing");
    }

    #[test]
    fn test_balanced_span_ignores_braces_in_strings() {
        let text = r#"note {"estimatedCost": 7, "itinerary": [{"day": 1, "date": "a{b}c", "activities": []}]} tail"#;
        let span = balanced_object_span(text).unwrap();
        assert!(span.starts_with(r#"{"estimatedCost""#));
        assert!(span.ends_with("]}"));

        let itinerary = finalize(text, &request());
        assert_eq!(itinerary.estimated_cost, 7.0);
        assert_eq!(itinerary.days[0].date, "a{b}c");
    }

    #[test]
    fn test_balanced_span_handles_escaped_quotes() {
        let text = r#"x {"estimatedCost": 1, "itinerary": [], "note": "say \"hi\" {}"} y"#;
        let span = balanced_object_span(text).unwrap();
        assert!(span.ends_with(r#"\"hi\" {}"}"#));
    }

    #[test]
    fn test_unclosed_object_has_no_span() {
        assert!(balanced_object_span(r#"{"estimatedCost": 1"#).is_none());
        assert!(balanced_object_span("no braces at all").is_none());
    }

    #[test]
    fn test_fallback_days_cover_range_with_preferences() {
        let days = fallback_days(&request());
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[0].date, "2025-11-10");
        assert_eq!(days[2].day, 3);
        assert_eq!(days[2].date, "2025-11-12");

        // Food + Culture preferences produce two activities per day
        assert_eq!(days[0].activities.len(), 2);
    }

    #[test]
    fn test_fallback_days_default_activity_without_preferences() {
        let mut req = request();
        req.preferences.clear();
        let days = fallback_days(&req);
        assert_eq!(days[0].activities.len(), 1);
        assert_eq!(days[0].activities[0].title, "City sightseeing");
    }
}
