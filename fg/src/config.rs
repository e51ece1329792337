//! Throttle configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Throttle configuration for one coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum spacing between admitted dispatches for the same key, in milliseconds
    #[serde(rename = "interval-ms", default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    crate::DEFAULT_THROTTLE_INTERVAL_MS
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl ThrottleConfig {
    /// Create a config with the given interval in milliseconds
    pub fn from_millis(interval_ms: u64) -> Self {
        Self { interval_ms }
    }

    /// Get the throttle interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
