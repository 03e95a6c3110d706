//! # Processor Module
//!
//! This module composes the runner, dispatcher, worker pool, and rate gate
//! into one explicitly constructed, explicitly shut down instance.
//!
//! ## Overview
//!
//! Orchestration code needs one handle that owns the concurrency machinery
//! for a whole collection run. The processor provides:
//! - Builder-based construction at startup (no lazy global state)
//! - Batch processing that offloads CPU-bound work to the worker pool
//! - Concurrent collection of I/O-bound tasks under the runner's limit
//! - A root cancellation token wired through every operation
//! - One `shutdown` at teardown: cancel cooperative work, drain the pool
//!
//! ## Example
//!
//! ```rust,no_run
//! use paceline::processor::Processor;
//!
//! # async fn demo() -> paceline::Result<()> {
//! let processor = Processor::builder()
//!     .max_concurrent_tasks(10)
//!     .rate(1.0)?
//!     .build()?;
//!
//! let parsed = processor
//!     .process_batches((0..5000).collect(), 100, |batch: Vec<u32>| {
//!         batch.into_iter().map(|n| n.to_string()).collect()
//!     })
//!     .await?;
//! # let _ = parsed;
//!
//! processor.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod builder;
mod core;

pub use builder::ProcessorBuilder;
pub use core::Processor;
