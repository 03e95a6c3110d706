use crate::gate::{RateGate, RateGateConfig};
use crate::offload::{WorkerPool, WorkerPoolConfig};
use crate::processor::Processor;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builder for [`Processor`].
///
/// Keep this surface small and predictable: a concurrency limit, a worker
/// pool, and an optional shared rate gate.
pub struct ProcessorBuilder {
    max_concurrent_tasks: usize,
    pool_config: WorkerPoolConfig,
    gate: Option<Arc<RateGate>>,
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        Self {
            max_concurrent_tasks: 10,
            pool_config: WorkerPoolConfig::default(),
            gate: None,
        }
    }

    /// Limit on simultaneously in-flight cooperative tasks (and batches).
    pub fn max_concurrent_tasks(mut self, n: usize) -> Self {
        self.max_concurrent_tasks = n;
        self
    }

    pub fn worker_pool_config(mut self, config: WorkerPoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Attach a rate gate pacing remote calls at `calls_per_sec`.
    pub fn rate(mut self, calls_per_sec: f64) -> Result<Self> {
        self.gate = Some(Arc::new(RateGate::new(RateGateConfig::from_rate(
            calls_per_sec,
        )?)));
        Ok(self)
    }

    /// Share an existing gate, e.g. one paced per remote account session.
    pub fn shared_gate(mut self, gate: Arc<RateGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn build(self) -> Result<Processor> {
        if self.max_concurrent_tasks == 0 {
            return Err(Error::configuration_with_context(
                "max_concurrent_tasks must be positive",
                ErrorContext::new()
                    .with_field_path("processor.max_concurrent_tasks")
                    .with_source("processor"),
            ));
        }
        let pool = Arc::new(WorkerPool::new(self.pool_config)?);
        Ok(Processor {
            max_concurrent_tasks: self.max_concurrent_tasks,
            pool,
            gate: self.gate,
            cancel: CancellationToken::new(),
        })
    }
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let processor = ProcessorBuilder::new().build().unwrap();
        assert!(processor.gate().is_none());
        assert!(processor.worker_pool().max_workers() >= 1);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(ProcessorBuilder::new().max_concurrent_tasks(0).build().is_err());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(ProcessorBuilder::new().rate(0.0).is_err());
    }

    #[test]
    fn test_shared_gate_is_attached() {
        let gate = Arc::new(RateGate::new(RateGateConfig::from_rate(2.0).unwrap()));
        let processor = ProcessorBuilder::new()
            .shared_gate(Arc::clone(&gate))
            .build()
            .unwrap();
        assert!(processor.gate().is_some());
    }
}
