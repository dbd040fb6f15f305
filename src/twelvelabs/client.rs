//! HTTP client wrapper for the video-understanding service.

use crate::config::Config;
use crate::twelvelabs::VideoTaskClient;
use crate::twelvelabs::types::{
    AnalyzeResponse, IndexDescription, IndexListResponse, IndexSummary, IndexingTask,
    TaskCreatedResponse, TaskResponse, TaskSnapshot, TaskStatus, TwelveLabsError, VideoId,
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url, multipart::Form};
use serde_json::json;
use time::OffsetDateTime;

/// Lightweight HTTP client for indexing and analysis calls.
pub struct TwelveLabsClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) api_key: String,
    pub(crate) index_id: String,
}

impl TwelveLabsClient {
    /// Construct a new client from explicit configuration.
    pub fn new(config: &Config) -> Result<Self, TwelveLabsError> {
        let client = Client::builder()
            .user_agent("vidseg/0.1")
            .timeout(config.request_timeout)
            .build()?;

        let base_url = normalize_base_url(&config.api_url).map_err(TwelveLabsError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            index_id = %config.index_id,
            has_api_key = !config.api_key.is_empty(),
            "Initialized video service HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            index_id: config.index_id.clone(),
        })
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, TwelveLabsError> {
        let url = format_endpoint(&self.base_url, segments)?;
        Ok(self
            .client
            .request(method, url)
            .header("x-api-key", &self.api_key))
    }

    async fn read_success(response: reqwest::Response) -> Result<reqwest::Response, TwelveLabsError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(TwelveLabsError::UnexpectedStatus { status, body })
        }
    }
}

#[async_trait]
impl VideoTaskClient for TwelveLabsClient {
    async fn submit(&self, video_url: &str) -> Result<IndexingTask, TwelveLabsError> {
        let form = Form::new()
            .text("index_id", self.index_id.clone())
            .text("video_url", video_url.to_string());

        let response = self
            .request(Method::POST, &["tasks"])?
            .multipart(form)
            .send()
            .await?;
        let response = Self::read_success(response).await.inspect_err(|error| {
            tracing::error!(error = %error, "Indexing task submission rejected");
        })?;

        let created: TaskCreatedResponse = response
            .json()
            .await
            .map_err(|error| TwelveLabsError::InvalidResponse(error.to_string()))?;
        if created.id.trim().is_empty() {
            return Err(TwelveLabsError::InvalidResponse(
                "task response carried an empty id".into(),
            ));
        }

        tracing::info!(task_id = %created.id, "Indexing task created");
        Ok(IndexingTask {
            task_id: created.id,
            submitted_at: OffsetDateTime::now_utc(),
        })
    }

    async fn retrieve(&self, task_id: &str) -> Result<TaskStatus, TwelveLabsError> {
        self.retrieve_snapshot(task_id)
            .await
            .map(|snapshot| snapshot.status)
    }

    async fn retrieve_snapshot(&self, task_id: &str) -> Result<TaskSnapshot, TwelveLabsError> {
        let response = self
            .request(Method::GET, &["tasks", path_id(task_id)?])?
            .send()
            .await?;
        let response = Self::read_success(response).await?;
        let task: TaskResponse = response
            .json()
            .await
            .map_err(|error| TwelveLabsError::InvalidResponse(error.to_string()))?;

        let status = TaskStatus::from_wire(&task.status, task.video_id);
        tracing::debug!(
            task_id,
            status = status.label(),
            wire_status = %task.status,
            "Retrieved task status"
        );
        Ok(TaskSnapshot {
            status,
            wire_status: task.status,
        })
    }

    async fn retrieve_topics(
        &self,
        video_id: &VideoId,
        prompt: &str,
    ) -> Result<String, TwelveLabsError> {
        let body = json!({
            "video_id": video_id.as_str(),
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .request(Method::POST, &["analyze"])?
            .json(&body)
            .send()
            .await?;
        let response = Self::read_success(response).await.inspect_err(|error| {
            tracing::error!(video_id = %video_id, error = %error, "Analysis request failed");
        })?;

        let payload: AnalyzeResponse = response
            .json()
            .await
            .map_err(|error| TwelveLabsError::InvalidResponse(error.to_string()))?;
        let text = payload.data.unwrap_or_default();
        tracing::debug!(video_id = %video_id, chars = text.len(), "Analysis text received");
        Ok(text)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexSummary>, TwelveLabsError> {
        let response = self.request(Method::GET, &["indexes"])?.send().await?;
        let response = Self::read_success(response).await?;
        let payload: IndexListResponse = response
            .json()
            .await
            .map_err(|error| TwelveLabsError::InvalidResponse(error.to_string()))?;
        Ok(payload.data.into_iter().map(IndexSummary::from).collect())
    }

    async fn describe_index(&self, index_id: &str) -> Result<Option<IndexSummary>, TwelveLabsError> {
        let response = self
            .request(Method::GET, &["indexes", path_id(index_id)?])?
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::read_success(response).await?;
        let description: IndexDescription = response
            .json()
            .await
            .map_err(|error| TwelveLabsError::InvalidResponse(error.to_string()))?;
        Ok(Some(description.into()))
    }

    fn index_id(&self) -> &str {
        &self.index_id
    }
}

fn normalize_base_url(url: &str) -> Result<Url, String> {
    let mut parsed = Url::parse(url).map_err(|err| err.to_string())?;
    if parsed.cannot_be_a_base() {
        return Err(format!("{url} cannot carry a path"));
    }
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed)
}

/// Append `segments` to `base`, percent-encoding each one as a single path segment.
fn format_endpoint(base: &Url, segments: &[&str]) -> Result<Url, TwelveLabsError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| TwelveLabsError::InvalidUrl(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Ids are opaque to this client but must stay within their own path segment.
fn path_id(id: &str) -> Result<&str, TwelveLabsError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(TwelveLabsError::InvalidIdentifier(id.to_string()));
    }
    Ok(id)
}
