//! Bounded blocking-worker pool.

use crate::{Error, ErrorContext, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Maximum simultaneously running workers.
    pub max_workers: usize,
    /// How long `shutdown` waits for in-flight work before abandoning it.
    pub shutdown_grace: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl WorkerPoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

fn default_max_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(32)
}

/// Decrements the in-flight count when the worker finishes. Lives inside the
/// blocking closure, so accounting tracks actual thread completion even if
/// the awaiting future is dropped.
struct ActiveGuard {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl ActiveGuard {
    fn enter(active: Arc<AtomicUsize>, drained: Arc<Notify>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active, drained }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }
}

/// Bounded pool of blocking workers with an explicit lifecycle: construct at
/// startup, `offload` during operation, `shutdown` once at teardown.
pub struct WorkerPool {
    config: WorkerPoolConfig,
    permits: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
    accepting: AtomicBool,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Result<Self> {
        if config.max_workers == 0 {
            return Err(Error::configuration_with_context(
                "max_workers must be positive",
                ErrorContext::new()
                    .with_field_path("pool.max_workers")
                    .with_source("worker_pool"),
            ));
        }
        let permits = Arc::new(Semaphore::new(config.max_workers));
        Ok(Self {
            config,
            permits,
            active: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
            accepting: AtomicBool::new(true),
        })
    }

    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    /// Workers currently running (not merely queued).
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Run `f` on a blocking worker thread and suspend until it completes.
    ///
    /// Waits cooperatively for a free worker slot. A panicking `f` surfaces
    /// as `Error::Runtime`; the pool itself stays usable.
    pub async fn offload<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(Self::shut_down_error());
        }
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Self::shut_down_error())?;

        let guard = ActiveGuard::enter(Arc::clone(&self.active), Arc::clone(&self.drained));
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _guard = guard;
            f()
        });

        match handle.await {
            Ok(value) => Ok(value),
            Err(join_err) if join_err.is_panic() => Err(Error::runtime_with_context(
                "offloaded task panicked",
                ErrorContext::new().with_source("worker_pool"),
            )),
            Err(_) => Err(Error::Cancelled),
        }
    }

    /// Stop accepting work, wake queued acquirers with an error, and wait for
    /// in-flight workers up to the configured grace period. Idempotent;
    /// subsequent calls return immediately.
    pub async fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }
        self.permits.close();
        debug!(
            active = self.active_count(),
            "worker pool shutting down; draining in-flight work"
        );
        if tokio::time::timeout(self.config.shutdown_grace, self.wait_idle())
            .await
            .is_err()
        {
            warn!(
                active = self.active_count(),
                grace_ms = self.config.shutdown_grace.as_millis() as u64,
                "shutdown grace expired; abandoning in-flight workers"
            );
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.drained.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn shut_down_error() -> Error {
        Error::runtime_with_context(
            "worker pool is shut down",
            ErrorContext::new().with_source("worker_pool"),
        )
    }
}
