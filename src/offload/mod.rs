//! # Worker Offload Module
//!
//! This module bridges CPU-bound or blocking work into the cooperative
//! scheduler: hand a closure to a bounded worker pool, suspend until it
//! completes, resume with the result.
//!
//! ## Overview
//!
//! Parsing, hashing, and file I/O stall the cooperative scheduler if run
//! inline. The pool provides:
//! - One explicit offload primitive, uniform with every other suspension
//!   point in the crate
//! - A hard bound on simultaneously running workers
//! - Panic isolation: a crashing worker surfaces as an error, not a dead pool
//! - A single shutdown at teardown that drains in-flight work up to a grace
//!   period
//!
//! ## Example
//!
//! ```rust,no_run
//! use paceline::offload::{WorkerPool, WorkerPoolConfig};
//!
//! # async fn demo() -> paceline::Result<()> {
//! let pool = WorkerPool::new(WorkerPoolConfig::default())?;
//!
//! let digest = pool.offload(|| expensive_parse("...")).await?;
//! # let _ = digest;
//!
//! pool.shutdown().await; // once, at teardown
//! # Ok(())
//! # }
//! # fn expensive_parse(s: &str) -> usize { s.len() }
//! ```

mod pool;

pub use pool::{WorkerPool, WorkerPoolConfig};
