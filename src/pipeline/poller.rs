//! Drives a submitted indexing task to a terminal state.
//!
//! The service's processing latency can only be observed by polling, so the poller asks for
//! the task status at a fixed interval until the task is ready, fails, or the wait ceiling
//! elapses. Every wait is raced against a [`CancellationToken`], so a caller can abort a run
//! that is mid-sleep.

use crate::config::Config;
use crate::pipeline::types::PollError;
use crate::twelvelabs::{TaskStatus, VideoId, VideoTaskClient};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};
use tokio_util::sync::CancellationToken;

/// Polling policy for indexing tasks.
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    interval: Duration,
    timeout: Duration,
    warmup: Duration,
}

impl TaskPoller {
    /// Poller with an explicit interval, wait ceiling, and post-ready warm-up.
    pub fn new(interval: Duration, timeout: Duration, warmup: Duration) -> Self {
        Self {
            interval,
            timeout,
            warmup,
        }
    }

    /// Poller using the timings from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval, config.poll_timeout, config.warmup_delay)
    }

    /// Poll `task_id` until it is ready and return its video id.
    ///
    /// `Failed` ends the wait immediately. Retrieval errors are treated as transient and
    /// polling continues until the wait ceiling. A poll still in flight at the ceiling is
    /// abandoned.
    pub async fn wait_for_ready<C>(
        &self,
        client: &C,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<VideoId, PollError>
    where
        C: VideoTaskClient + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let timed_out = |attempt: u32| {
            let waited = started.elapsed();
            tracing::warn!(task_id, attempt, waited = ?waited, "Indexing task wait timed out");
            PollError::TimedOut {
                task_id: task_id.to_string(),
                waited,
            }
        };
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                polled = timeout_at(deadline, client.retrieve(task_id)) => polled,
            };
            let Ok(polled) = polled else {
                return Err(timed_out(attempt));
            };

            match polled {
                Ok(TaskStatus::Ready(video_id)) => {
                    tracing::info!(
                        task_id,
                        video_id = %video_id,
                        attempt,
                        waited_ms = started.elapsed().as_millis() as u64,
                        "Indexing task ready"
                    );
                    return Ok(video_id);
                }
                Ok(TaskStatus::Failed) => {
                    tracing::warn!(task_id, attempt, "Indexing task failed remotely");
                    return Err(PollError::TaskFailed {
                        task_id: task_id.to_string(),
                    });
                }
                Ok(TaskStatus::Processing) => {
                    tracing::debug!(task_id, attempt, "Indexing task still processing");
                }
                Ok(TaskStatus::Unknown(raw)) => {
                    tracing::debug!(task_id, attempt, status = %raw, "Unrecognized task status");
                }
                Err(error) => {
                    tracing::warn!(task_id, attempt, error = %error, "Task status poll failed; retrying");
                }
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(timed_out(attempt));
            }

            let pause = self.interval.min(self.timeout - waited);
            sleep_or_cancel(pause, cancel).await?;
        }
    }

    /// Pause once after a task became ready, before its output is queried.
    ///
    /// The service can report readiness slightly before analysis over the video works.
    pub async fn warm_up(&self, cancel: &CancellationToken) -> Result<(), PollError> {
        if self.warmup.is_zero() {
            return Ok(());
        }
        tracing::debug!(delay = ?self.warmup, "Waiting for indexed video to become queryable");
        sleep_or_cancel(self.warmup, cancel).await
    }
}

async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<(), PollError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PollError::Cancelled),
        _ = sleep(duration) => Ok(()),
    }
}
