use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing segmentation runs.
///
/// An empty segment list is returned both when a run fails and when a video has no
/// distinct topics; these counters are how the two cases are told apart.
#[derive(Default)]
pub struct PipelineMetrics {
    runs_started: AtomicU64,
    runs_with_segments: AtomicU64,
    runs_without_segments: AtomicU64,
    runs_failed: AtomicU64,
    segments_extracted: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a pipeline run has begun.
    pub fn record_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run that reached the extraction step, with the number of segments recovered.
    pub fn record_completed(&self, segment_count: u64) {
        if segment_count == 0 {
            self.runs_without_segments.fetch_add(1, Ordering::Relaxed);
        } else {
            self.runs_with_segments.fetch_add(1, Ordering::Relaxed);
            self.segments_extracted
                .fetch_add(segment_count, Ordering::Relaxed);
        }
    }

    /// Record a run that was short-circuited by a failure, timeout, or cancellation.
    pub fn record_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_with_segments: self.runs_with_segments.load(Ordering::Relaxed),
            runs_without_segments: self.runs_without_segments.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            segments_extracted: self.segments_extracted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Pipeline runs started since startup.
    pub runs_started: u64,
    /// Runs that finished with at least one segment.
    pub runs_with_segments: u64,
    /// Runs that reached extraction but recovered no segments.
    pub runs_without_segments: u64,
    /// Runs that ended early because of a failure.
    pub runs_failed: u64,
    /// Total segments returned across all runs.
    pub segments_extracted: u64,
}
