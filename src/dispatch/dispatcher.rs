//! Batch dispatcher.

use crate::runner::TaskRunner;
use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One batch's captured failure.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub message: String,
}

impl BatchFailure {
    pub fn new(batch_index: usize, message: impl Into<String>) -> Self {
        Self {
            batch_index,
            message: message.into(),
        }
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch {}: {}", self.batch_index, self.message)
    }
}

impl std::error::Error for BatchFailure {}

/// Merged results of a dispatch plus per-batch failure detail.
#[derive(Debug)]
pub struct DispatchOutcome<R> {
    /// Per-item results of every surviving batch, merged in batch order.
    pub results: Vec<R>,
    /// Failures of the batches that contributed nothing.
    pub failures: Vec<BatchFailure>,
    pub batches_dispatched: usize,
    pub execution_time: Duration,
}

impl<R> DispatchOutcome<R> {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fraction of dispatched batches that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.batches_dispatched == 0 {
            1.0
        } else {
            let ok = self.batches_dispatched - self.failures.len();
            ok as f64 / self.batches_dispatched as f64
        }
    }

    pub fn into_results(self) -> Vec<R> {
        self.results
    }
}

/// Applies a batch-processing function to a large ordered collection: split
/// into fixed-size batches, dispatch under a batch-level concurrency limit,
/// merge surviving batches' results in batch order.
///
/// A failed batch contributes zero results and is logged; the call errors
/// only when every batch fails.
pub struct BatchDispatcher {
    batch_size: usize,
    max_concurrent_batches: usize,
    cancel: Option<CancellationToken>,
}

impl BatchDispatcher {
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::configuration_with_context(
                "batch_size must be positive",
                ErrorContext::new()
                    .with_field_path("batch_size")
                    .with_source("dispatcher"),
            ));
        }
        if max_concurrent_batches == 0 {
            return Err(Error::configuration_with_context(
                "max_concurrent_batches must be positive",
                ErrorContext::new()
                    .with_field_path("max_concurrent_batches")
                    .with_source("dispatcher"),
            ));
        }
        Ok(Self {
            batch_size,
            max_concurrent_batches,
            cancel: None,
        })
    }

    /// Attach a cancellation token, propagated to the underlying runner.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_concurrent_batches(&self) -> usize {
        self.max_concurrent_batches
    }

    /// Process `items` and return the merged per-item results.
    pub async fn process<T, R, E, F, Fut>(&self, items: Vec<T>, processor: F) -> Result<Vec<R>>
    where
        F: Fn(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, E>>,
        E: fmt::Display,
    {
        Ok(self.process_detailed(items, processor).await?.into_results())
    }

    /// Process `items`, returning merged results together with per-batch
    /// failure detail and timing.
    pub async fn process_detailed<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        processor: F,
    ) -> Result<DispatchOutcome<R>>
    where
        F: Fn(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, E>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        if items.is_empty() {
            return Ok(DispatchOutcome {
                results: Vec::new(),
                failures: Vec::new(),
                batches_dispatched: 0,
                execution_time: started.elapsed(),
            });
        }

        let batches = split_batches(items, self.batch_size);
        let total_batches = batches.len();

        let mut runner = TaskRunner::new(self.max_concurrent_batches)?;
        if let Some(token) = &self.cancel {
            runner = runner.with_cancellation(token.clone());
        }

        // Runner slots are ordered by submission, so iterating the returned
        // sequence merges in batch order.
        let task_results = runner
            .run_all(batches.into_iter().map(|batch| processor(batch)))
            .await?;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for task_result in task_results {
            match task_result {
                Ok(batch_results) => results.extend(batch_results),
                Err(err) => {
                    warn!(
                        batch_index = err.index,
                        error = %err.message,
                        "batch failed; skipping its results"
                    );
                    failures.push(BatchFailure::new(err.index, err.message));
                }
            }
        }

        if !failures.is_empty() && failures.len() == total_batches {
            return Err(Error::AllBatchesFailed { failures });
        }

        Ok(DispatchOutcome {
            results,
            failures,
            batches_dispatched: total_batches,
            execution_time: started.elapsed(),
        })
    }
}

/// Batch `k` holds `items[k*batch_size .. (k+1)*batch_size]`; the last batch
/// may be shorter. Concatenating the batches reconstructs the input exactly.
fn split_batches<T>(items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let mut batches = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut iter = items.into_iter();
    loop {
        let batch: Vec<T> = iter.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(BatchDispatcher::new(0, 4).is_err());
        assert!(BatchDispatcher::new(10, 0).is_err());
        assert!(BatchDispatcher::new(10, 4).is_ok());
    }

    #[test]
    fn test_split_batches_boundaries() {
        let batches = split_batches((0..10).collect(), 4);
        assert_eq!(batches, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);

        let exact = split_batches((0..8).collect::<Vec<i32>>(), 4);
        assert_eq!(exact.len(), 2);
        assert_eq!(exact[1], vec![4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_empty_input_never_invokes_processor() {
        let dispatcher = BatchDispatcher::new(10, 2).unwrap();
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);

        let results: Vec<u32> = dispatcher
            .process(Vec::new(), move |batch: Vec<u32>| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, String>(batch) }
            })
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_round_trip_covers_every_item_once_in_batch_order() {
        let dispatcher = BatchDispatcher::new(7, 3).unwrap();
        let items: Vec<u32> = (0..7 * 6).collect();

        let results = dispatcher
            .process(items.clone(), |batch| async move {
                Ok::<_, String>(batch.into_iter().map(|n| n * 10).collect())
            })
            .await
            .unwrap();

        let expected: Vec<u32> = items.iter().map(|n| n * 10).collect();
        assert_eq!(results, expected);
    }

    #[tokio::test]
    async fn test_short_last_batch_is_preserved() {
        let dispatcher = BatchDispatcher::new(4, 2).unwrap();
        let results = dispatcher
            .process((0..9).collect(), |batch: Vec<i32>| async move {
                Ok::<_, String>(batch)
            })
            .await
            .unwrap();
        assert_eq!(results, (0..9).collect::<Vec<i32>>());
    }

    #[tokio::test]
    async fn test_single_batch_failure_is_tolerated() {
        let dispatcher = BatchDispatcher::new(5, 2).unwrap();
        let items: Vec<u32> = (0..20).collect();

        let outcome = dispatcher
            .process_detailed(items, |batch| async move {
                // The batch starting at 10 (batch index 2) fails.
                if batch[0] == 10 {
                    Err("poisoned batch".to_string())
                } else {
                    Ok(batch)
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.batches_dispatched, 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].batch_index, 2);
        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.success_rate(), 0.75);

        // The failed batch's 5 items are missing, everything else survives in order.
        let expected: Vec<u32> = (0..10).chain(15..20).collect();
        assert_eq!(outcome.results, expected);
    }

    #[tokio::test]
    async fn test_all_batches_failed_is_an_error() {
        let dispatcher = BatchDispatcher::new(3, 2).unwrap();
        let err = dispatcher
            .process((0..9).collect::<Vec<i32>>(), |_batch| async move {
                Err::<Vec<i32>, _>("down for maintenance".to_string())
            })
            .await
            .unwrap_err();

        match err {
            Error::AllBatchesFailed { failures } => {
                assert_eq!(failures.len(), 3);
                assert!(failures.iter().all(|f| f.message.contains("maintenance")));
            }
            other => panic!("expected AllBatchesFailed, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let token = CancellationToken::new();
        token.cancel();
        let dispatcher = BatchDispatcher::new(2, 2)
            .unwrap()
            .with_cancellation(token);
        let err = dispatcher
            .process((0..8).collect::<Vec<i32>>(), |batch| async move {
                Ok::<_, String>(batch)
            })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
