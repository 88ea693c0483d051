//! When to poll next.
//!
//! A snapshot says how long the current track has left *on the server*. The
//! local player lags the server by however much audio it has buffered, so
//! the next poll is due at `remaining + buffer_delay`. That keeps the display
//! flipping to the new track when the listener actually hears it, not when
//! the server starts sending it.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::TimingConfig;

pub const DEFAULT_BUFFER_DELAY_SECS: f64 = 4.0;
pub const DEFAULT_RETRY: Duration = Duration::from_secs(60);

/// No track runs this long; a larger `remaining` is a server bug, and
/// polling again within a day bounds the damage.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Estimates how far the local player trails the live stream, in seconds.
///
/// `None` means "can't tell right now" (nothing playing yet, player gone).
#[async_trait]
pub trait BufferDelay: Send + Sync {
    async fn estimate(&self) -> Option<f64>;
}

/// A constant lag, for players whose buffer depth is known up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub f64);

#[async_trait]
impl BufferDelay for FixedDelay {
    async fn estimate(&self) -> Option<f64> {
        Some(self.0)
    }
}

/// Always indeterminate; every poll uses the schedule's fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEstimate;

#[async_trait]
impl BufferDelay for NoEstimate {
    async fn estimate(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub fallback_buffer_secs: f64,
    pub min_delay: Duration,
    pub retry: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            fallback_buffer_secs: DEFAULT_BUFFER_DELAY_SECS,
            min_delay: Duration::ZERO,
            retry: DEFAULT_RETRY,
        }
    }
}

impl Schedule {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            fallback_buffer_secs: timing.default_buffer_delay_secs.max(0.0),
            min_delay: timing.min_delay(),
            retry: timing.retry(),
        }
    }

    /// The buffer delay actually applied for a given estimate.
    pub fn buffer_secs(&self, estimate: Option<f64>) -> f64 {
        estimate
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(self.fallback_buffer_secs)
    }

    /// Delay before the next poll after a successful one.
    pub fn after_snapshot(&self, remaining_secs: f64, estimate: Option<f64>) -> Duration {
        let secs = remaining_secs + self.buffer_secs(estimate);
        let delay = if secs.is_finite() && secs > 0.0 {
            Duration::try_from_secs_f64(secs)
                .unwrap_or(MAX_DELAY)
                .min(MAX_DELAY)
        } else {
            Duration::ZERO
        };
        delay.max(self.min_delay)
    }

    /// Delay before retrying after a failed poll. Prior track timing is
    /// irrelevant here.
    pub fn after_failure(&self) -> Duration {
        self.retry
    }
}
