//! Itinerary planning orchestration
//!
//! Builds the natural-language prompt, talks to the generative completion
//! service, and turns its output into a structured [`Itinerary`] via the
//! stream interpreter and finalizer. A failed completion request is the
//! one error class surfaced to the caller; everything below degrades.

use crate::config::GenerativeConfig;
use crate::finalize::{fallback_days, finalize};
use crate::models::{Itinerary, ItineraryRequest};
use crate::stream::StreamInterpreter;
use crate::TripWeaveError;
use anyhow::{Context, Result};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Completion response envelope from the generative service
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    output: Option<CompletionOutput>,
}

#[derive(Debug, Deserialize)]
struct CompletionOutput {
    text: Option<String>,
}

/// Plans itineraries against the configured generative service
pub struct ItineraryPlanner {
    client: reqwest::Client,
    config: GenerativeConfig,
}

impl ItineraryPlanner {
    /// Create a new planner
    pub fn new(config: GenerativeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent("TripWeave/0.1.0")
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// True when the planner can reach the generative service
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !(self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.config.app_id.as_deref().is_some_and(|k| !k.is_empty()))
    }

    /// Plan an itinerary with a single non-streaming completion request.
    ///
    /// Without credentials the planner degrades to a locally generated
    /// itinerary instead of failing.
    #[instrument(skip(self, request), fields(destination = %request.destination))]
    pub async fn plan(&self, request: &ItineraryRequest) -> Result<Itinerary> {
        if self.is_degraded() {
            warn!("No generative credentials, producing fallback itinerary");
            return Ok(self.fallback_itinerary(request));
        }

        let text = self.complete(&build_prompt(request)).await?;
        info!("Completion received, {} chars", text.len());

        Ok(finalize(&text, request))
    }

    /// Plan an itinerary from a fragment stream, reporting each
    /// progressive rendering to `on_render`. Fragments are processed
    /// strictly in arrival order.
    pub async fn plan_streamed<S>(
        &self,
        request: &ItineraryRequest,
        mut fragments: S,
        mut on_render: impl FnMut(&str),
    ) -> Result<Itinerary>
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut interpreter = StreamInterpreter::new();

        while let Some(fragment) = fragments.next().await {
            on_render(interpreter.on_fragment(&fragment));
        }
        interpreter.on_stream_end();

        Ok(finalize(interpreter.accumulated(), request))
    }

    /// Issue one completion request and return the generated text
    async fn complete(&self, prompt: &str) -> Result<String> {
        let app_id = self.config.app_id.as_deref().unwrap_or_default();
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let url = format!("{}/{}/completion", self.config.base_url, app_id);

        let body = serde_json::json!({
            "input": { "prompt": prompt },
            "parameters": {}
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TripWeaveError::api(format!("Completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TripWeaveError::api(format!(
                "Completion request failed with status {status}"
            ))
            .into());
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| TripWeaveError::api(format!("Invalid completion response: {e}")))?;

        Ok(completion
            .output
            .and_then(|output| output.text)
            .unwrap_or_default())
    }

    /// Locally generated itinerary for degraded mode
    fn fallback_itinerary(&self, request: &ItineraryRequest) -> Itinerary {
        Itinerary {
            id: format!("itinerary_{}", Utc::now().timestamp_millis()),
            title: format!("{} Travel Plan", request.destination),
            destination: request.destination.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            budget: request.budget,
            estimated_cost: (request.budget * 0.8).round(),
            days: fallback_days(request),
        }
    }
}

/// Build the completion prompt embedding all request fields and the exact
/// JSON shape the service must return.
#[must_use]
pub fn build_prompt(request: &ItineraryRequest) -> String {
    let preferences = request
        .preferences
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Plan a detailed travel itinerary with the following requirements:
Destination: {destination}
Travel dates: {start} to {end}
Budget: {budget}
Travelers: {travelers}
Preferences: {preferences}
Special requests: {special}

Return the result in exactly this JSON format:
{{
  "estimatedCost": 3000,
  "itinerary": [
    {{
      "day": 1,
      "date": "YYYY-MM-DD",
      "activities": [
        {{
          "time": "09:00",
          "title": "Activity title",
          "description": "Detailed activity description",
          "location": "Activity location",
          "duration": "Activity duration",
          "cost": 100
        }}
      ]
    }}
  ]
}}

Notes:
1. The schedule must be reasonable and follow time logic
2. Activities must match the stated preferences
3. Cost estimates should be as accurate as possible
4. Return only JSON data, no other content, no Markdown formatting"#,
        destination = request.destination,
        start = request.start_date,
        end = request.end_date,
        budget = request.budget,
        travelers = request.travelers,
        preferences = preferences,
        special = request.special_requests.as_deref().unwrap_or("none"),
    )
}
