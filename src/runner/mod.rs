//! # Bounded Task Runner Module
//!
//! This module executes ordered collections of independent asynchronous tasks
//! under a hard concurrency ceiling.
//!
//! ## Overview
//!
//! Collection pipelines fan out over many remote calls at once, but the
//! remote side only tolerates a bounded number in flight. The runner provides:
//! - At most `max_concurrent` tasks started-but-not-finished at any instant
//! - Results slotted by submission index, independent of completion order
//! - Per-task failures captured inline, never aborting sibling tasks
//! - An optional progress side channel invoked after each completion
//! - Cooperative cancellation that abandons pending work
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TaskRunner`] | Bounded-concurrency executor for ordered task sequences |
//! | [`TaskError`] | Captured failure of one task: its index and message |
//! | [`TaskResult`] | Per-slot outcome: produced value or captured failure |
//!
//! ## Example
//!
//! ```rust
//! use paceline::runner::TaskRunner;
//!
//! # async fn demo() -> paceline::Result<()> {
//! let runner = TaskRunner::new(4)?;
//! let tasks = (0..16).map(|i| async move { Ok::<_, String>(i * 2) });
//! let results = runner.run_all(tasks).await?;
//!
//! assert_eq!(results.len(), 16);
//! assert_eq!(*results[3].as_ref().unwrap(), 6);
//! # Ok(())
//! # }
//! ```

mod task_runner;

pub use task_runner::{TaskError, TaskResult, TaskRunner};
