//! # paceline
//!
//! Bounded-concurrency task execution, batching, rate pacing and TTL
//! memoization primitives for rate-limited collection pipelines.
//!
//! ## Overview
//!
//! Clients that enumerate large remote datasets (members, messages, media)
//! through a rate-sensitive API all face the same mechanics: fan out over
//! many paginated calls without exceeding what the remote tolerates, survive
//! partial failure, and avoid re-asking questions that were just answered.
//! This crate packages those mechanics as a small library; the orchestration
//! layer that actually talks to a remote API and renders reports stays
//! outside it.
//!
//! ## Core Principles
//!
//! - **Bounded by construction**: every fan-out runs under an explicit
//!   concurrency ceiling; every worker pool has a hard size
//! - **Failure is data**: one task's error lands in that task's result slot,
//!   never in its siblings'
//! - **Order-stable**: results line up with submissions, regardless of
//!   completion order
//! - **Explicit lifecycle**: components are constructed at startup and shut
//!   down at teardown; there is no lazy global state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paceline::processor::Processor;
//!
//! #[tokio::main]
//! async fn main() -> paceline::Result<()> {
//!     let processor = Processor::builder()
//!         .max_concurrent_tasks(10)
//!         .rate(1.0)? // one remote call per second
//!         .build()?;
//!
//!     // CPU-bound parsing in batches on the worker pool:
//!     let summaries = processor
//!         .process_batches(fetch_raw_messages(), 100, summarize_batch)
//!         .await?;
//!     let _ = summaries;
//!
//!     processor.shutdown().await;
//!     Ok(())
//! }
//! # fn fetch_raw_messages() -> Vec<String> { Vec::new() }
//! # fn summarize_batch(batch: Vec<String>) -> Vec<usize> {
//! #     batch.into_iter().map(|m| m.len()).collect()
//! # }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`runner`] | Bounded-concurrency execution of ordered task sequences |
//! | [`dispatch`] | Fixed-size batching over the runner with order-stable merge |
//! | [`gate`] | Minimum-interval pacing for rate-sensitive call sites |
//! | [`cache`] | TTL memoization with a size-bounded store |
//! | [`offload`] | Blocking-worker bridge with explicit lifecycle |
//! | [`processor`] | Dependency-injected composition of the above |

pub mod cache;
pub mod dispatch;
pub mod gate;
pub mod offload;
pub mod processor;
pub mod runner;

// Re-export main types for convenience
pub use dispatch::{BatchDispatcher, BatchFailure, DispatchOutcome};
pub use gate::{RateGate, RateGateConfig};
pub use processor::{Processor, ProcessorBuilder};
pub use runner::{TaskError, TaskResult, TaskRunner};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
