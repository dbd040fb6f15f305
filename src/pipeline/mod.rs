//! Indexing and segmentation pipeline: submission, polling, analysis, and extraction.

pub mod extract;
pub mod poller;
mod service;
pub mod types;

pub use extract::{JsonCarvingExtractor, Segment, SegmentExtractor, extract_segments};
pub use poller::TaskPoller;
pub use service::{SEGMENTATION_PROMPT, SegmentationApi, SegmentationService};
pub use types::{
    IndexReport, PipelineDiagnostics, PipelineError, PipelineResult, PollError, RunOutcome,
    TaskStatusReport,
};
