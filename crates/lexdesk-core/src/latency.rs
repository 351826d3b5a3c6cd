//! Simulated per-operation latency.

use std::time::Duration;

/// Fixed artificial delay applied at the start of each store operation.
///
/// Unconditional and not a timeout: it only mimics a remote backend for
/// front-end development. Zero by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency(Duration);

impl Latency {
    pub fn none() -> Self {
        Self(Duration::ZERO)
    }

    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    pub async fn simulate(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}
