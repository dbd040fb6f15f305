//! Segmentation service coordinating submission, polling, analysis, and extraction.

use crate::{
    config::Config,
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        extract::{JsonCarvingExtractor, Segment, SegmentExtractor},
        poller::TaskPoller,
        types::{
            IndexReport, PipelineDiagnostics, PipelineError, PipelineResult, RunOutcome,
            TaskStatusReport,
        },
    },
    twelvelabs::{IndexingTask, TwelveLabsClient, TwelveLabsError, VideoTaskClient},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Prompt sent to the analysis endpoint. Its JSON shape is what the extractor expects.
pub const SEGMENTATION_PROMPT: &str = r#"Divide this lecture video into its distinct topics, in chronological order.
Each topic must cover one contiguous span of the video, and spans must not overlap.
Respond with strictly valid JSON and nothing else, using exactly this shape:
{"segments": [{"count": 0, "start": <start time in seconds>, "end": <end time in seconds>, "title": "<short topic title>", "summary": "<one or two sentence summary>"}]}
Times are numbers of seconds from the beginning of the video. Always set "count" to 0."#;

/// Runs the full "index and segment a video" flow.
///
/// Holds the service client, the polling policy, and the extractor. Construct it once near
/// process start and share it through an `Arc`; runs for different videos share no mutable
/// state beyond the metrics counters.
pub struct SegmentationService {
    client: Arc<dyn VideoTaskClient>,
    poller: TaskPoller,
    extractor: Box<dyn SegmentExtractor>,
    prompt: String,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the segmentation pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait SegmentationApi: Send + Sync {
    /// Index `video_url` and return its topic segments. Never fails; see [`PipelineResult`].
    async fn index_and_segment(&self, video_url: &str, cancel: CancellationToken)
    -> PipelineResult;

    /// Submit a video for indexing without waiting for it.
    async fn start_indexing(&self, video_url: &str) -> Result<IndexingTask, TwelveLabsError>;

    /// Look up the current status of a task.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport, TwelveLabsError>;

    /// Check the service and the configured index.
    async fn verify_index(&self) -> IndexReport;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SegmentationService {
    /// Build a service around an existing client and polling policy.
    pub fn new(client: Arc<dyn VideoTaskClient>, poller: TaskPoller) -> Self {
        Self {
            client,
            poller,
            extractor: Box::new(JsonCarvingExtractor),
            prompt: SEGMENTATION_PROMPT.to_string(),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build a service talking to the configured video-understanding service.
    pub fn from_config(config: &Config) -> Result<Self, TwelveLabsError> {
        let client = TwelveLabsClient::new(config)?;
        Ok(Self::new(Arc::new(client), TaskPoller::from_config(config)))
    }

    /// Replace the segment extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn SegmentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the analysis prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Index a video and extract its topic segments.
    ///
    /// Every failure (rejected submission, failed task, timeout, cancellation, failed
    /// analysis) is logged and yields an empty segment list; the reason is recorded in the
    /// result's diagnostics.
    pub async fn index_and_segment(
        &self,
        video_url: &str,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let started = Instant::now();
        self.metrics.record_started();
        tracing::info!(video_url, "Segmentation run started");

        let mut diagnostics = PipelineDiagnostics::default();
        let outcome = self.run(video_url, cancel, &mut diagnostics).await;
        diagnostics.elapsed_ms = started.elapsed().as_millis() as u64;

        let segments = match outcome {
            Ok(segments) => {
                self.metrics.record_completed(segments.len() as u64);
                diagnostics.outcome = if segments.is_empty() {
                    RunOutcome::NoSegments
                } else {
                    RunOutcome::Completed
                };
                tracing::info!(
                    video_url,
                    task_id = diagnostics.task_id.as_deref(),
                    segments = segments.len(),
                    elapsed_ms = diagnostics.elapsed_ms,
                    "Segmentation run finished"
                );
                segments
            }
            Err(error) => {
                self.metrics.record_failed();
                diagnostics.outcome = error.outcome();
                diagnostics.error = Some(error.to_string());
                match error {
                    PipelineError::Cancelled => tracing::info!(
                        video_url,
                        task_id = diagnostics.task_id.as_deref(),
                        "Segmentation run cancelled"
                    ),
                    _ => tracing::error!(
                        video_url,
                        task_id = diagnostics.task_id.as_deref(),
                        outcome = ?diagnostics.outcome,
                        error = %error,
                        "Segmentation run failed; returning no segments"
                    ),
                }
                Vec::new()
            }
        };

        PipelineResult {
            segments,
            diagnostics,
        }
    }

    async fn run(
        &self,
        video_url: &str,
        cancel: &CancellationToken,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<Vec<Segment>, PipelineError> {
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            submitted = self.client.submit(video_url) => submitted,
        };
        let task = submitted.map_err(PipelineError::Submission)?;
        diagnostics.task_id = Some(task.task_id.clone());

        let video_id = self
            .poller
            .wait_for_ready(self.client.as_ref(), &task.task_id, cancel)
            .await?;
        diagnostics.video_id = Some(video_id.clone());

        self.poller.warm_up(cancel).await?;

        let analyzed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            analyzed = self.client.retrieve_topics(&video_id, &self.prompt) => analyzed,
        };
        let raw = analyzed.map_err(PipelineError::Analysis)?;

        Ok(self.extractor.extract(Some(&raw)))
    }

    /// Submit a video for indexing and return the task handle.
    pub async fn start_indexing(&self, video_url: &str) -> Result<IndexingTask, TwelveLabsError> {
        let task = self.client.submit(video_url).await.inspect_err(|error| {
            tracing::error!(video_url, error = %error, "Failed to start indexing");
        })?;
        tracing::info!(
            video_url,
            task_id = %task.task_id,
            submitted_at = %format_timestamp(&task),
            "Indexing started"
        );
        Ok(task)
    }

    /// Retrieve the current status of a task.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport, TwelveLabsError> {
        let snapshot = self.client.retrieve_snapshot(task_id).await?;
        Ok(TaskStatusReport {
            task_id: task_id.to_string(),
            state: snapshot.status.label().to_string(),
            video_id: snapshot.status.video_id().cloned(),
            status: snapshot.wire_status,
        })
    }

    /// Check the service and describe the configured index.
    pub async fn verify_index(&self) -> IndexReport {
        let index_id = self.client.index_id().to_string();
        let mut report = IndexReport {
            reachable: false,
            index_id: index_id.clone(),
            index_found: false,
            index_name: None,
            visible_indexes: 0,
            models: Vec::new(),
            supports_analysis: false,
            error: None,
        };

        match self.client.list_indexes().await {
            Ok(indexes) => {
                report.reachable = true;
                report.visible_indexes = indexes.len();
            }
            Err(error) => {
                tracing::warn!(error = %error, "Video service check failed");
                report.error = Some(error.to_string());
                return report;
            }
        }

        match self.client.describe_index(&index_id).await {
            Ok(Some(summary)) => {
                report.index_found = true;
                report.supports_analysis = summary.supports_analysis();
                report.index_name = summary.name;
                report.models = summary.models;
                if !report.supports_analysis {
                    tracing::warn!(index_id = %index_id, models = ?report.models, "Index has no generative model; analysis will fail");
                }
            }
            Ok(None) => {
                tracing::warn!(index_id = %index_id, "Configured index not found");
                report.error = Some(format!("index {index_id} not found"));
            }
            Err(error) => {
                tracing::warn!(index_id = %index_id, error = %error, "Index lookup failed");
                report.error = Some(error.to_string());
            }
        }

        report
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn format_timestamp(task: &IndexingTask) -> String {
    task.submitted_at
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| task.submitted_at.unix_timestamp().to_string())
}

#[async_trait]
impl SegmentationApi for SegmentationService {
    async fn index_and_segment(
        &self,
        video_url: &str,
        cancel: CancellationToken,
    ) -> PipelineResult {
        SegmentationService::index_and_segment(self, video_url, &cancel).await
    }

    async fn start_indexing(&self, video_url: &str) -> Result<IndexingTask, TwelveLabsError> {
        SegmentationService::start_indexing(self, video_url).await
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport, TwelveLabsError> {
        SegmentationService::task_status(self, task_id).await
    }

    async fn verify_index(&self) -> IndexReport {
        SegmentationService::verify_index(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SegmentationService::metrics_snapshot(self)
    }
}
