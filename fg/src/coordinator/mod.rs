//! Coordinator for keyed async reads
//!
//! Composes the throttle gate and the call sequencer around an underlying
//! read operation. Throttled and zombie calls resolve to `Ok(None)`; failures
//! of the underlying read propagate unchanged.

mod core;
mod stats;

pub use self::core::{FetchFuture, ThrottledFetch, throttled_fetch};
pub use stats::FetchStats;
