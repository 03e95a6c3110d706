use crate::{Error, ErrorContext, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct GateSnapshot {
    pub calls_per_sec: f64,
    pub min_interval_ms: u64,
    /// Estimated wait until the next grant (ms), if a caller would wait now.
    pub estimated_wait_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RateGateConfig {
    /// Grants per second.
    pub calls_per_sec: f64,
}

impl RateGateConfig {
    pub fn from_rate(calls_per_sec: f64) -> Result<Self> {
        if !calls_per_sec.is_finite() || calls_per_sec <= 0.0 {
            return Err(Error::configuration_with_context(
                "calls_per_sec must be finite and positive",
                ErrorContext::new()
                    .with_field_path("gate.calls_per_sec")
                    .with_details(format!("got {}", calls_per_sec)),
            ));
        }
        Ok(Self { calls_per_sec })
    }

    /// Minimum spacing between grants, derived from the rate.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.calls_per_sec)
    }
}

#[derive(Debug)]
struct State {
    /// Most recently reserved grant time. Later than `now` when callers have
    /// reserved slots they are still sleeping toward.
    last_granted: Option<Instant>,
}

/// Minimum-interval pacing gate, shared across concurrent callers.
///
/// Each `acquire` reserves the next free grant slot inside one critical
/// section (`grant = max(now, last + min_interval)`, then swap) and sleeps
/// outside the lock. Two callers can therefore never observe grants closer
/// together than the configured interval. Grant order follows reservation
/// order; no FIFO fairness beyond that.
pub struct RateGate {
    cfg: RateGateConfig,
    min_interval: Duration,
    state: Mutex<State>,
}

impl RateGate {
    pub fn new(cfg: RateGateConfig) -> Self {
        let min_interval = cfg.min_interval();
        Self {
            cfg,
            min_interval,
            state: Mutex::new(State { last_granted: None }),
        }
    }

    /// Wait until at least `min_interval` has elapsed since the previous
    /// grant, then pass. Never errors, only delays.
    pub async fn acquire(&self) {
        let grant = {
            let mut st = self.state.lock().await;
            let now = Instant::now();
            let grant = match st.last_granted {
                Some(last) => (last + self.min_interval).max(now),
                None => now,
            };
            st.last_granted = Some(grant);
            grant
        };
        tokio::time::sleep_until(grant).await;
    }

    /// Pass immediately if a grant slot is free, without waiting.
    pub async fn try_acquire(&self) -> bool {
        let mut st = self.state.lock().await;
        let now = Instant::now();
        match st.last_granted {
            Some(last) if now < last + self.min_interval => false,
            _ => {
                st.last_granted = Some(now);
                true
            }
        }
    }

    /// Push the next grant out by an externally imposed delay (e.g. the
    /// remote service asked us to slow down). Never pulls a grant earlier.
    pub async fn report_backoff(&self, delay: Duration) {
        let mut st = self.state.lock().await;
        let resume = Instant::now() + delay;
        // Anchor so that `anchor + min_interval == resume`.
        let anchor = resume.checked_sub(self.min_interval).unwrap_or(resume);
        st.last_granted = Some(match st.last_granted {
            Some(last) => last.max(anchor),
            None => anchor,
        });
    }

    pub async fn snapshot(&self) -> GateSnapshot {
        let st = self.state.lock().await;
        let now = Instant::now();
        let estimated_wait_ms = st.last_granted.and_then(|last| {
            let next = last + self.min_interval;
            if next > now {
                Some(next.duration_since(now).as_millis() as u64)
            } else {
                None
            }
        });
        GateSnapshot {
            calls_per_sec: self.cfg.calls_per_sec,
            min_interval_ms: self.min_interval.as_millis() as u64,
            estimated_wait_ms,
        }
    }
}
