use crate::dispatch::BatchDispatcher;
use crate::gate::RateGate;
use crate::offload::WorkerPool;
use crate::processor::ProcessorBuilder;
use crate::runner::{TaskResult, TaskRunner};
use crate::Result;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Composition root for one collection run: bounded runner, batch dispatch
/// with worker offload, optional shared rate gate, root cancellation.
///
/// Construct one per session via [`Processor::builder`], pass it to whatever
/// orchestration needs it, and call [`Processor::shutdown`] exactly once at
/// teardown.
pub struct Processor {
    pub(crate) max_concurrent_tasks: usize,
    pub(crate) pool: Arc<WorkerPool>,
    pub(crate) gate: Option<Arc<RateGate>>,
    pub(crate) cancel: CancellationToken,
}

impl Processor {
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::new()
    }

    pub fn worker_pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Gate shared by callers that talk to the rate-sensitive remote, if one
    /// was configured.
    pub fn gate(&self) -> Option<&Arc<RateGate>> {
        self.gate.as_ref()
    }

    /// Token cancelling every operation started by this processor. Hand it
    /// to an interrupt handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    fn runner(&self) -> Result<TaskRunner> {
        Ok(TaskRunner::new(self.max_concurrent_tasks)?
            .with_cancellation(self.cancel.child_token()))
    }

    /// Split `items` into `batch_size` chunks and run the synchronous,
    /// CPU-bound `processor_fn` over each chunk on the worker pool, at most
    /// `max_concurrent_tasks` batches in flight. Results merge in batch
    /// order; failed batches are skipped unless every batch fails.
    pub async fn process_batches<T, R, F>(
        &self,
        items: Vec<T>,
        batch_size: usize,
        processor_fn: F,
    ) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(Vec<T>) -> Vec<R> + Send + Sync + Clone + 'static,
    {
        let dispatcher = BatchDispatcher::new(batch_size, self.max_concurrent_tasks)?
            .with_cancellation(self.cancel.child_token());
        let pool = Arc::clone(&self.pool);
        dispatcher
            .process(items, move |batch| {
                let f = processor_fn.clone();
                let pool = Arc::clone(&pool);
                async move { pool.offload(move || f(batch)).await }
            })
            .await
    }

    /// Run I/O-bound futures under the concurrency limit, per-item failures
    /// captured inline.
    pub async fn collect_concurrent<I, Fut, T, E>(&self, tasks: I) -> Result<Vec<TaskResult<T>>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        self.runner()?.run_all(tasks).await
    }

    /// As [`collect_concurrent`](Self::collect_concurrent), reporting
    /// `(completed, total, result)` after each completion.
    pub async fn collect_with_progress<I, Fut, T, E, P>(
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
        self.runner()?.run_with_progress(tasks, progress).await
    }

    /// Cancel outstanding cooperative work and drain the worker pool.
    /// Call once, at teardown.
    pub async fn shutdown(&self) {
        debug!("processor shutting down");
        self.cancel.cancel();
        self.pool.shutdown().await;
    }
}
