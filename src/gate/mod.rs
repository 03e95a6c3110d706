//! # Rate Gate Module
//!
//! This module provides call pacing for rate-sensitive operations, spacing
//! invocations of a shared call site by a minimum interval.
//!
//! ## Overview
//!
//! Remote collection APIs tolerate a bounded request rate and respond to
//! bursts with implicit throttling. The gate keeps callers under that rate:
//! - Any number of concurrent tasks share one gate instance
//! - Each grant is spaced at least `1 / calls_per_sec` after the previous one
//! - Waiting is cooperative; no thread is blocked
//! - Remote "slow down" signals can push the next grant further out
//!
//! ## Example
//!
//! ```rust
//! use paceline::gate::{RateGate, RateGateConfig};
//!
//! # async fn demo() -> paceline::Result<()> {
//! let gate = RateGate::new(RateGateConfig::from_rate(4.0)?);
//!
//! gate.acquire().await; // first grant passes immediately
//! gate.acquire().await; // second grant waits out the 250ms interval
//! # Ok(())
//! # }
//! ```

mod rate_gate;

pub use rate_gate::{GateSnapshot, RateGate, RateGateConfig};
