//! Core data types and error definitions for the segmentation pipeline.

use crate::pipeline::extract::Segment;
use crate::twelvelabs::{TwelveLabsError, VideoId};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Ways a task can fail to reach the ready state.
#[derive(Debug, Error)]
pub enum PollError {
    /// The service reported the task as failed.
    #[error("indexing task {task_id} failed remotely")]
    TaskFailed {
        /// Task that failed.
        task_id: String,
    },
    /// The task was still unresolved when the wait ceiling elapsed.
    #[error("indexing task {task_id} not ready after {waited:?}")]
    TimedOut {
        /// Task that was being waited on.
        task_id: String,
        /// Time spent waiting before giving up.
        waited: Duration,
    },
    /// The caller cancelled the wait.
    #[error("wait cancelled")]
    Cancelled,
}

/// Errors that end a pipeline run early.
///
/// None of these escape [`crate::pipeline::SegmentationService::index_and_segment`]; they are
/// logged and folded into [`PipelineDiagnostics`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The service rejected the submission or could not be reached.
    #[error("failed to submit video: {0}")]
    Submission(#[source] TwelveLabsError),
    /// The service reported the task as failed.
    #[error("indexing task {task_id} failed remotely")]
    TaskFailed {
        /// Task that failed.
        task_id: String,
    },
    /// The task did not become ready in time.
    #[error("indexing task {task_id} not ready after {waited:?}")]
    TimedOut {
        /// Task that was being waited on.
        task_id: String,
        /// Time spent waiting before giving up.
        waited: Duration,
    },
    /// The analysis call failed.
    #[error("topic analysis failed: {0}")]
    Analysis(#[source] TwelveLabsError),
    /// The caller cancelled the run.
    #[error("run cancelled")]
    Cancelled,
}

impl From<PollError> for PipelineError {
    fn from(error: PollError) -> Self {
        match error {
            PollError::TaskFailed { task_id } => Self::TaskFailed { task_id },
            PollError::TimedOut { task_id, waited } => Self::TimedOut { task_id, waited },
            PollError::Cancelled => Self::Cancelled,
        }
    }
}

impl PipelineError {
    /// Outcome recorded in diagnostics for this error.
    pub fn outcome(&self) -> RunOutcome {
        match self {
            Self::Submission(_) => RunOutcome::SubmissionFailed,
            Self::TaskFailed { .. } => RunOutcome::TaskFailed,
            Self::TimedOut { .. } => RunOutcome::TimedOut,
            Self::Analysis(_) => RunOutcome::AnalysisFailed,
            Self::Cancelled => RunOutcome::Cancelled,
        }
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Segments were extracted.
    Completed,
    /// Analysis succeeded but produced no usable segments.
    NoSegments,
    /// Submission was rejected or the service was unreachable.
    SubmissionFailed,
    /// The service reported the task as failed.
    TaskFailed,
    /// The task never became ready within the wait ceiling.
    TimedOut,
    /// The caller cancelled the run.
    Cancelled,
    /// The analysis call failed.
    AnalysisFailed,
}

/// Out-of-band record describing what happened during a run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDiagnostics {
    /// Task created by the submission, if any.
    pub task_id: Option<String>,
    /// Video id observed once the task became ready.
    pub video_id: Option<VideoId>,
    /// Final outcome of the run.
    pub outcome: RunOutcome,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
    /// Rendered error for runs that ended early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for PipelineDiagnostics {
    fn default() -> Self {
        Self {
            task_id: None,
            video_id: None,
            outcome: RunOutcome::NoSegments,
            elapsed_ms: 0,
            error: None,
        }
    }
}

/// Result of indexing and segmenting one video. Always well formed, possibly empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    /// Topic segments in the order the analysis reported them.
    pub segments: Vec<Segment>,
    /// Diagnostics for the run that produced the segments.
    pub diagnostics: PipelineDiagnostics,
}

/// Snapshot of a single task, as reported to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusReport {
    /// Task that was looked up.
    pub task_id: String,
    /// Status exactly as the service reported it (`validating`, `indexing`, `ready`, ...).
    pub status: String,
    /// Pipeline view of the status: `processing`, `ready`, `failed`, or the raw unknown value.
    pub state: String,
    /// Video id, present once the task is ready.
    pub video_id: Option<VideoId>,
}

/// Reachability and readiness snapshot for the configured index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Whether the service answered at all.
    pub reachable: bool,
    /// Configured index id.
    pub index_id: String,
    /// Whether the configured index exists.
    pub index_found: bool,
    /// Index name reported by the service.
    pub index_name: Option<String>,
    /// Number of indexes visible to the API key.
    pub visible_indexes: usize,
    /// Models enabled on the configured index.
    pub models: Vec<String>,
    /// Whether the index can serve topic analysis.
    pub supports_analysis: bool,
    /// Diagnostic captured when the check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
