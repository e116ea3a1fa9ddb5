use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::error::{Result, WatchError};

/// Random pre-fetch delay, so scheduled runs on different machines do not
/// hit the origin in the same second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min_ms: u64,
    max_ms: u64,
}

impl Jitter {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        let min_ms = whole_millis(min)?;
        let max_ms = whole_millis(max)?;
        if max_ms < min_ms {
            return Err(WatchError::Config(format!(
                "jitter max ({max_ms}ms) is below min ({min_ms}ms)"
            )));
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.max_ms == 0
    }

    /// Uniform in `[min, max]` at millisecond resolution.
    pub fn sample(&self) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    pub async fn wait(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            info!(delay_ms = %delay.as_millis(), "Waiting before fetch");
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

fn whole_millis(d: Duration) -> Result<u64> {
    u64::try_from(d.as_millis())
        .map_err(|_| WatchError::Config(format!("jitter bound {}s is too large", d.as_secs())))
}
