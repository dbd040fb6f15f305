//! Boundary to the remote video-understanding service.
//!
//! Everything the pipeline knows about the service goes through [`VideoTaskClient`]. Wire
//! payloads are converted into [`TaskStatus`] here, once, so downstream code matches on a
//! closed set of states instead of probing optional fields.

pub mod client;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

use async_trait::async_trait;

pub use client::TwelveLabsClient;
pub use types::{
    IndexSummary, IndexingTask, TaskSnapshot, TaskStatus, TwelveLabsError, VideoId,
};

/// Operations the pipeline needs from the video-understanding service.
#[async_trait]
pub trait VideoTaskClient: Send + Sync {
    /// Submit a publicly reachable video for indexing.
    ///
    /// Creates remote state outside this process's control; a failure after the request left
    /// the process may still leave an orphaned task behind.
    async fn submit(&self, video_url: &str) -> Result<IndexingTask, TwelveLabsError>;

    /// Fetch the current status of a task.
    ///
    /// An `Err` means the service could not be asked, not that the task failed.
    async fn retrieve(&self, task_id: &str) -> Result<TaskStatus, TwelveLabsError>;

    /// Fetch the status of a task along with the service's own state string.
    ///
    /// Clients that do not see the wire payload report the status label instead.
    async fn retrieve_snapshot(&self, task_id: &str) -> Result<TaskSnapshot, TwelveLabsError> {
        let status = self.retrieve(task_id).await?;
        Ok(TaskSnapshot {
            wire_status: status.label().to_string(),
            status,
        })
    }

    /// Run an analysis prompt against an indexed video and return the raw text answer.
    async fn retrieve_topics(
        &self,
        video_id: &VideoId,
        prompt: &str,
    ) -> Result<String, TwelveLabsError>;

    /// Enumerate indexes visible to the configured API key.
    async fn list_indexes(&self) -> Result<Vec<IndexSummary>, TwelveLabsError>;

    /// Look up a single index, returning `None` when it does not exist.
    async fn describe_index(&self, index_id: &str) -> Result<Option<IndexSummary>, TwelveLabsError>;

    /// Index that submissions are sent to.
    fn index_id(&self) -> &str;
}
