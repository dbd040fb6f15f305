//! Scripted in-memory client for exercising the pipeline without a network.

use crate::twelvelabs::{
    IndexSummary, IndexingTask, TaskStatus, TwelveLabsError, VideoId, VideoTaskClient,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::Instant;

/// One scripted answer to a `retrieve` call.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Status(TaskStatus),
    /// Answer with the status only after the delay.
    Slow(Duration, TaskStatus),
    Unreachable,
}

pub(crate) struct ScriptedClient {
    task_id: Option<String>,
    steps: Mutex<VecDeque<Step>>,
    exhausted: TaskStatus,
    topics: Option<String>,
    polls: AtomicUsize,
    poll_times: Mutex<Vec<Instant>>,
    submissions: AtomicUsize,
    prompts: Mutex<Vec<(VideoId, String)>>,
}

impl ScriptedClient {
    /// Client whose submissions succeed with `task_id` and whose polls follow `steps`.
    pub(crate) fn new(task_id: &str, steps: Vec<Step>) -> Self {
        Self {
            task_id: Some(task_id.to_string()),
            steps: Mutex::new(steps.into()),
            exhausted: TaskStatus::Processing,
            topics: None,
            polls: AtomicUsize::new(0),
            poll_times: Mutex::new(Vec::new()),
            submissions: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Client whose submissions are rejected.
    pub(crate) fn rejecting() -> Self {
        Self {
            task_id: None,
            ..Self::new("", Vec::new())
        }
    }

    /// Answer analysis calls with `text`; without this they fail.
    pub(crate) fn with_topics(mut self, text: &str) -> Self {
        self.topics = Some(text.to_string());
        self
    }

    pub(crate) fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().expect("poll times").clone()
    }

    pub(crate) fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<(VideoId, String)> {
        self.prompts.lock().expect("prompts").clone()
    }
}

fn outage() -> TwelveLabsError {
    TwelveLabsError::UnexpectedStatus {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "scripted outage".into(),
    }
}

#[async_trait]
impl VideoTaskClient for ScriptedClient {
    async fn submit(&self, _video_url: &str) -> Result<IndexingTask, TwelveLabsError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let task_id = self.task_id.clone().ok_or_else(outage)?;
        Ok(IndexingTask {
            task_id,
            submitted_at: OffsetDateTime::now_utc(),
        })
    }

    async fn retrieve(&self, _task_id: &str) -> Result<TaskStatus, TwelveLabsError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.poll_times
            .lock()
            .expect("poll times")
            .push(Instant::now());
        let step = self.steps.lock().expect("steps").pop_front();
        match step {
            Some(Step::Status(status)) => Ok(status),
            Some(Step::Slow(delay, status)) => {
                tokio::time::sleep(delay).await;
                Ok(status)
            }
            Some(Step::Unreachable) => Err(outage()),
            None => Ok(self.exhausted.clone()),
        }
    }

    async fn retrieve_topics(
        &self,
        video_id: &VideoId,
        prompt: &str,
    ) -> Result<String, TwelveLabsError> {
        self.prompts
            .lock()
            .expect("prompts")
            .push((video_id.clone(), prompt.to_string()));
        self.topics.clone().ok_or_else(outage)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexSummary>, TwelveLabsError> {
        Ok(Vec::new())
    }

    async fn describe_index(&self, _index_id: &str) -> Result<Option<IndexSummary>, TwelveLabsError> {
        Ok(None)
    }

    fn index_id(&self) -> &str {
        "scripted-index"
    }
}
