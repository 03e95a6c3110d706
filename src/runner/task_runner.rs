//! Bounded-concurrency task execution.

use crate::{Error, ErrorContext, Result};
use futures::StreamExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of one submitted task: its produced value, or its captured failure.
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Captured failure of an individual task. Holds the submission index so the
/// failure can be traced back to its originating item.
#[derive(Debug, Clone)]
pub struct TaskError {
    pub index: usize,
    pub message: String,
}

impl TaskError {
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {} failed: {}", self.index, self.message)
    }
}

impl std::error::Error for TaskError {}

/// Executes ordered sequences of independent async tasks with at most
/// `max_concurrent` in flight at any instant.
///
/// Result slot `i` always corresponds to submitted task `i`. One task's
/// failure never cancels its siblings; it is captured as a [`TaskError`] in
/// that task's slot.
pub struct TaskRunner {
    max_concurrent: usize,
    cancel: Option<CancellationToken>,
}

impl TaskRunner {
    pub fn new(max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(Error::configuration_with_context(
                "max_concurrent must be positive",
                ErrorContext::new()
                    .with_field_path("max_concurrent")
                    .with_source("task_runner"),
            ));
        }
        Ok(Self {
            max_concurrent,
            cancel: None,
        })
    }

    /// Attach a cancellation token. When it fires, pending tasks are
    /// abandoned, in-flight tasks are dropped at their next suspension point,
    /// and the run returns [`Error::Cancelled`] with no partial results.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run all tasks, collecting one result per task in submission order.
    pub async fn run_all<I, Fut, T, E>(&self, tasks: I) -> Result<Vec<TaskResult<T>>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        self.run_inner(tasks, None::<fn(usize, usize, &TaskResult<T>)>)
            .await
    }

    /// Run all tasks, invoking `progress(completed, total, result)` after each
    /// completion. The callback is a best-effort side channel: a panicking
    /// callback is caught, logged, and ignored.
    pub async fn run_with_progress<I, Fut, T, E, P>(
        &self,
        tasks: I,
        progress: P,
    ) -> Result<Vec<TaskResult<T>>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
        P: Fn(usize, usize, &TaskResult<T>),
    {
        self.run_inner(tasks, Some(progress)).await
    }

    async fn run_inner<I, Fut, T, E, P>(
        &self,
        tasks: I,
        progress: Option<P>,
    ) -> Result<Vec<TaskResult<T>>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
        P: Fn(usize, usize, &TaskResult<T>),
    {
        let task_futures: Vec<Fut> = tasks.into_iter().collect();
        let total = task_futures.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        let run_id = Uuid::new_v4();
        debug!(
            run_id = %run_id,
            total,
            max_concurrent = self.max_concurrent,
            "starting bounded task run"
        );

        let mut out: Vec<Option<TaskResult<T>>> = (0..total).map(|_| None).collect();
        let mut stream = futures::stream::iter(task_futures.into_iter().enumerate())
            .map(|(index, fut)| async move {
                let result = fut
                    .await
                    .map_err(|e| TaskError::new(index, e.to_string()));
                (index, result)
            })
            .buffer_unordered(self.max_concurrent);

        let mut completed = 0usize;
        loop {
            let next = match &self.cancel {
                Some(token) => tokio::select! {
                    _ = token.cancelled() => {
                        debug!(run_id = %run_id, completed, total, "task run cancelled");
                        return Err(Error::Cancelled);
                    }
                    item = stream.next() => item,
                },
                None => stream.next().await,
            };
            let Some((index, result)) = next else { break };

            completed += 1;
            if let Err(err) = &result {
                warn!(run_id = %run_id, index, error = %err.message, "task failed; capturing result");
            }
            if let Some(cb) = &progress {
                let invoked =
                    std::panic::catch_unwind(AssertUnwindSafe(|| cb(completed, total, &result)));
                if invoked.is_err() {
                    warn!(run_id = %run_id, completed, "progress callback panicked; ignoring");
                }
            }
            out[index] = Some(result);
        }

        debug!(run_id = %run_id, total, "task run complete");
        Ok(out
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| Err(TaskError::new(index, "task result missing")))
            })
            .collect())
    }
}
