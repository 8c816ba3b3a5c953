//! Progressive itinerary-stream interpreter
//!
//! Consumes text fragments from a streaming completion and maintains a
//! human-readable rendering of the itinerary extracted so far. Intermediate
//! accumulations are never valid JSON, so extraction is a tolerant
//! structural scan over the raw text, not a parse.
//!
//! Recognized grammar subset:
//!
//! ```text
//! costField  := '"estimatedCost"' ws ':' ws number
//! dayMarker  := '"day"' ws ':' ws integer .*? '"date"' ws ':' ws string
//! titleField := '"title"' ws ':' ws string
//! ```
//!
//! The whole accumulated text is re-scanned on every fragment. Recomputing
//! from scratch keeps the rendering consistent with everything received so
//! far and makes the result independent of how the text was chunked.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static COST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""estimatedCost"\s*:\s*(\d+(?:\.\d+)?)"#).unwrap());

static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"day"\s*:\s*(\d+).*?"date"\s*:\s*"([^"]*)""#).unwrap());

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title"\s*:\s*"([^"]*)""#).unwrap());

/// Mutable state of one streaming planning request
#[derive(Debug, Default)]
pub struct StreamState {
    /// Raw accumulated text, append-only
    pub raw: String,
    /// Rendering derived from `raw`, recomputed per fragment
    pub rendered: String,
    /// Set once the stream has ended
    pub complete: bool,
}

/// Interprets a fragment stream into a progressive itinerary rendering
#[derive(Debug, Default)]
pub struct StreamInterpreter {
    state: StreamState,
}

impl StreamInterpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full accumulated text received so far
    #[must_use]
    pub fn accumulated(&self) -> &str {
        &self.state.raw
    }

    /// Current progressive rendering
    #[must_use]
    pub fn rendering(&self) -> &str {
        &self.state.rendered
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    /// Append one fragment and return the updated rendering.
    ///
    /// A failed scan keeps the previous rendering; partial progress is
    /// never regressed and errors are never surfaced to the caller.
    pub fn on_fragment(&mut self, fragment: &str) -> &str {
        self.state.raw.push_str(fragment);

        match render_snapshot(&self.state.raw) {
            Ok(rendered) => self.state.rendered = rendered,
            Err(e) => debug!("Keeping previous rendering, scan failed: {e}"),
        }

        &self.state.rendered
    }

    /// Mark the stream as ended. The accumulated text is then handed to
    /// the finalizer by the caller.
    pub fn on_stream_end(&mut self) {
        self.state.complete = true;
        debug!(
            "Stream complete, {} chars accumulated",
            self.state.raw.len()
        );
    }
}

/// Re-scan the full accumulated text and produce the rendering
fn render_snapshot(raw: &str) -> Result<String> {
    let mut lines = Vec::new();

    if let Some(caps) = COST_RE.captures(raw) {
        let cost: f64 = caps[1].parse()?;
        lines.push(format!("Estimated cost: ¥{cost}"));
    }

    let day_spans: Vec<(usize, u32, String)> = DAY_RE
        .captures_iter(raw)
        .map(|caps| {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            let day: u32 = caps[1].parse().unwrap_or(0);
            (start, day, caps[2].to_string())
        })
        .collect();

    if day_spans.is_empty() {
        lines.push("Generating itinerary...".to_string());
        return Ok(lines.join("\n"));
    }

    for (i, (start, day, date)) in day_spans.iter().enumerate() {
        lines.push(format!("Day {day} ({date})"));

        let span_end = day_spans
            .get(i + 1)
            .map_or(raw.len(), |(next_start, _, _)| *next_start);
        let span = &raw[*start..span_end];

        let mut found_title = false;
        for caps in TITLE_RE.captures_iter(span) {
            lines.push(format!("  - {}", &caps[1]));
            found_title = true;
        }

        if !found_title {
            lines.push("  (activities pending)".to_string());
        }
    }

    Ok(lines.join("\n"))
}
