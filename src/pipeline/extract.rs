//! Best-effort recovery of topic segments from free-form analysis text.
//!
//! The analysis model is asked for strict JSON but routinely wraps it in prose or code
//! fences. Extraction is a heuristic, not a parser: it carves out the span from the first
//! `{` to the last `}` and parses that span strictly. Anything ambiguous or malformed
//! yields an empty list. Within a well-formed payload, entries that do not describe a
//! segment are skipped individually.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

/// A titled, timestamped span of a video covering one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Reserved counter, always 0 in current payloads.
    #[serde(default)]
    pub count: i64,
    /// Start of the span in seconds.
    pub start: f64,
    /// End of the span in seconds.
    pub end: f64,
    /// Short topic title.
    pub title: String,
    /// Brief summary of the topic.
    #[serde(default)]
    pub summary: String,
}

impl Segment {
    /// Clamp negative timestamps to zero and swap reversed bounds.
    fn normalized(mut self) -> Self {
        self.start = self.start.max(0.0);
        self.end = self.end.max(0.0);
        if self.end < self.start {
            std::mem::swap(&mut self.start, &mut self.end);
        }
        self
    }
}

#[derive(Deserialize)]
struct SegmentsEnvelope {
    segments: Vec<serde_json::Value>,
}

/// Turns raw analysis text into segments.
///
/// Implementations must never fail: unusable input yields an empty list.
pub trait SegmentExtractor: Send + Sync {
    /// Recover segments from `raw`, preserving payload order.
    fn extract(&self, raw: Option<&str>) -> Vec<Segment>;
}

/// Extractor that carves the outermost JSON object out of surrounding prose.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCarvingExtractor;

impl SegmentExtractor for JsonCarvingExtractor {
    fn extract(&self, raw: Option<&str>) -> Vec<Segment> {
        extract_segments(raw)
    }
}

/// Recover segments from analysis text using [`JsonCarvingExtractor`] rules.
pub fn extract_segments(raw: Option<&str>) -> Vec<Segment> {
    let Some(text) = raw.filter(|text| !text.trim().is_empty()) else {
        tracing::debug!("Analysis text empty; no segments");
        return Vec::new();
    };

    let Some(candidate) = JSON_OBJECT.find(text) else {
        tracing::warn!(chars = text.len(), "Analysis text contained no JSON object");
        return Vec::new();
    };

    match serde_json::from_str::<SegmentsEnvelope>(candidate.as_str()) {
        Ok(envelope) => envelope
            .segments
            .into_iter()
            .enumerate()
            .filter_map(|(position, entry)| match serde_json::from_value::<Segment>(entry) {
                Ok(segment) => Some(segment.normalized()),
                Err(error) => {
                    tracing::warn!(position, error = %error, "Skipping unusable segment entry");
                    None
                }
            })
            .collect(),
        Err(error) => {
            tracing::warn!(
                error = %error,
                chars = candidate.as_str().len(),
                "Analysis payload was not valid segment JSON"
            );
            Vec::new()
        }
    }
}
