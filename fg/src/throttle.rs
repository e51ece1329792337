//! Per-key throttle gate
//!
//! Suppresses dispatches that arrive faster than the configured interval
//! since the last admitted dispatch for the same key. Denial is silent: the
//! caller's next poll simply tries again.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Tracks the last admitted dispatch per key
#[derive(Debug)]
pub struct ThrottleGate<K> {
    /// Interval applied to keys without an override
    interval: Duration,

    /// Per-key interval overrides
    overrides: HashMap<K, Duration>,

    /// Timestamp of the most recently admitted dispatch per key
    last_dispatch: HashMap<K, Instant>,
}

impl<K> ThrottleGate<K>
where
    K: Clone + Eq + Hash + Debug,
{
    /// Create a gate with the same interval for every key
    pub fn new(interval: Duration) -> Self {
        debug!(?interval, "ThrottleGate::new: called");
        Self {
            interval,
            overrides: HashMap::new(),
            last_dispatch: HashMap::new(),
        }
    }

    /// Use a different interval for one key
    pub fn with_key_interval(mut self, key: K, interval: Duration) -> Self {
        self.set_key_interval(key, interval);
        self
    }

    /// Override the interval for one key in place
    pub fn set_key_interval(&mut self, key: K, interval: Duration) {
        debug!(?key, ?interval, "ThrottleGate::set_key_interval: called");
        self.overrides.insert(key, interval);
    }

    /// The interval that applies to `key`
    pub fn interval_for(&self, key: &K) -> Duration {
        self.overrides.get(key).copied().unwrap_or(self.interval)
    }

    /// Decide whether a dispatch for `key` at `now` may proceed.
    ///
    /// On admission the dispatch time is recorded; on denial nothing changes.
    pub fn admit(&mut self, key: &K, now: Instant) -> bool {
        let interval = self.interval_for(key);

        if let Some(last) = self.last_dispatch.get(key) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < interval {
                debug!(?key, ?elapsed, ?interval, "ThrottleGate::admit: denied");
                return false;
            }
        }

        debug!(?key, "ThrottleGate::admit: admitted");
        self.last_dispatch.insert(key.clone(), now);
        true
    }

    /// When the last dispatch for `key` was admitted, if ever
    pub fn last_dispatch(&self, key: &K) -> Option<Instant> {
        self.last_dispatch.get(key).copied()
    }
}
