//! # Batch Dispatch Module
//!
//! This module splits large ordered collections into fixed-size batches and
//! runs them through the bounded task runner.
//!
//! ## Overview
//!
//! Batching is essential for:
//! - Amortizing per-call overhead across many items
//! - Keeping batch-level concurrency under a remote service's tolerance
//! - Tolerating partial failure: one bad batch never sinks the others
//! - Reproducible output: results merge in batch order
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchDispatcher`] | Splits, dispatches, and merges batches |
//! | [`DispatchOutcome`] | Merged results plus per-batch failure detail |
//! | [`BatchFailure`] | One batch's captured failure |
//!
//! ## Example
//!
//! ```rust
//! use paceline::dispatch::BatchDispatcher;
//!
//! # async fn demo() -> paceline::Result<()> {
//! let dispatcher = BatchDispatcher::new(100, 4)?;
//! let items: Vec<u32> = (0..1000).collect();
//!
//! let doubled = dispatcher
//!     .process(items, |batch| async move {
//!         Ok::<_, String>(batch.into_iter().map(|n| n * 2).collect())
//!     })
//!     .await?;
//! assert_eq!(doubled.len(), 1000);
//! # Ok(())
//! # }
//! ```

mod dispatcher;

pub use dispatcher::{BatchDispatcher, BatchFailure, DispatchOutcome};
