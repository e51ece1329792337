//! Coordinator statistics

/// Counters for one coordinator, across all keys
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    /// Calls admitted by the throttle gate
    pub dispatched: u64,

    /// Calls denied by the throttle gate
    pub throttled: u64,

    /// Results delivered to callers
    pub delivered: u64,

    /// Results discarded as zombies
    pub zombies: u64,

    /// Underlying reads that failed
    pub failed: u64,
}

impl FetchStats {
    /// Total calls made through the coordinator
    pub fn total_calls(&self) -> u64 {
        self.dispatched + self.throttled
    }

    /// Dispatched reads that have not settled yet (or whose future was dropped)
    pub fn unsettled(&self) -> u64 {
        self.dispatched
            .saturating_sub(self.delivered + self.zombies + self.failed)
    }
}
