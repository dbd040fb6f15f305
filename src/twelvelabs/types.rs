//! Shared types used by the video-understanding client and its callers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors returned while interacting with the video-understanding service.
#[derive(Debug, Error)]
pub enum TwelveLabsError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service responded with an unexpected status code.
    #[error("Unexpected service response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The response body did not match the expected shape.
    #[error("Malformed service response: {0}")]
    InvalidResponse(String),
    /// A task or index id cannot be used as a URL path segment.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Handle for a submitted indexing task.
#[derive(Debug, Clone)]
pub struct IndexingTask {
    /// Opaque task identifier assigned by the service.
    pub task_id: String,
    /// Local time at which the submission was acknowledged.
    pub submitted_at: OffsetDateTime,
}

/// Identifier the service assigns to a video once indexing completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latest observed state of an indexing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// The service is still working on the video.
    Processing,
    /// Indexing finished and the video can be analyzed.
    Ready(VideoId),
    /// The service gave up on the task.
    Failed,
    /// The service reported a state this client does not recognize.
    Unknown(String),
}

impl TaskStatus {
    /// Convert the wire `status`/`video_id` pair into a status variant.
    ///
    /// A `ready` task without a video id is not usable yet and maps to `Unknown`.
    pub fn from_wire(status: &str, video_id: Option<String>) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "ready" => match video_id.filter(|id| !id.trim().is_empty()) {
                Some(id) => Self::Ready(VideoId::new(id)),
                None => Self::Unknown("ready (missing video id)".to_string()),
            },
            "failed" | "error" => Self::Failed,
            "validating" | "pending" | "queued" | "indexing" | "processing" => Self::Processing,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Short label used in logs and status reports.
    pub fn label(&self) -> &str {
        match self {
            Self::Processing => "processing",
            Self::Ready(_) => "ready",
            Self::Failed => "failed",
            Self::Unknown(raw) => raw,
        }
    }

    /// Video id carried by a ready task.
    pub fn video_id(&self) -> Option<&VideoId> {
        match self {
            Self::Ready(id) => Some(id),
            _ => None,
        }
    }
}

/// A task status together with the state string the service reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// Parsed status used for control flow.
    pub status: TaskStatus,
    /// Status exactly as the service sent it, e.g. `validating` or `indexing`.
    pub wire_status: String,
}

/// Index metadata relevant to segmentation.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    /// Index identifier.
    pub id: String,
    /// Human readable index name, when the service provides one.
    pub name: Option<String>,
    /// Model names enabled on the index.
    pub models: Vec<String>,
}

impl IndexSummary {
    /// Whether the index has a generative model that can answer analysis prompts.
    pub fn supports_analysis(&self) -> bool {
        self.models
            .iter()
            .any(|model| model.to_ascii_lowercase().starts_with("pegasus"))
    }
}

#[derive(Deserialize)]
pub(crate) struct TaskCreatedResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
}

#[derive(Deserialize)]
pub(crate) struct TaskResponse {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) video_id: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct AnalyzeResponse {
    #[serde(default)]
    pub(crate) data: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct IndexListResponse {
    #[serde(default)]
    pub(crate) data: Vec<IndexDescription>,
}

#[derive(Deserialize)]
pub(crate) struct IndexDescription {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) index_name: Option<String>,
    #[serde(default)]
    pub(crate) models: Vec<IndexModel>,
}

#[derive(Deserialize)]
pub(crate) struct IndexModel {
    pub(crate) model_name: String,
}

impl From<IndexDescription> for IndexSummary {
    fn from(description: IndexDescription) -> Self {
        Self {
            id: description.id,
            name: description.index_name,
            models: description
                .models
                .into_iter()
                .map(|model| model.model_name)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_wire_statuses() {
        assert_eq!(
            TaskStatus::from_wire("ready", Some("V1".into())),
            TaskStatus::Ready(VideoId::new("V1"))
        );
        assert_eq!(TaskStatus::from_wire("indexing", None), TaskStatus::Processing);
        assert_eq!(TaskStatus::from_wire("Queued", None), TaskStatus::Processing);
        assert_eq!(TaskStatus::from_wire("failed", None), TaskStatus::Failed);
        assert_eq!(TaskStatus::from_wire("error", Some("V1".into())), TaskStatus::Failed);
        assert_eq!(
            TaskStatus::from_wire("paused", None),
            TaskStatus::Unknown("paused".into())
        );
    }

    #[test]
    fn ready_without_video_id_is_not_ready() {
        let status = TaskStatus::from_wire("ready", Some("  ".into()));
        assert!(matches!(status, TaskStatus::Unknown(_)));
        assert!(status.video_id().is_none());
    }

    #[test]
    fn analysis_support_requires_generative_model() {
        let embed_only = IndexSummary {
            id: "idx".into(),
            name: None,
            models: vec!["marengo2.7".into()],
        };
        assert!(!embed_only.supports_analysis());

        let generative = IndexSummary {
            models: vec!["marengo2.7".into(), "Pegasus1.2".into()],
            ..embed_only
        };
        assert!(generative.supports_analysis());
    }
}
