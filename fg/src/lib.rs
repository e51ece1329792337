//! FetchGate - throttled, staleness-safe coordinator for keyed async reads
//!
//! Polling loops fire at a fixed cadence regardless of how slow the remote end
//! is. FetchGate wraps any keyed async read so that such a loop can neither
//! flood the endpoint nor observe its data moving backward in time.
//!
//! # Core Concepts
//!
//! - **Throttle Gate**: per key, a dispatch is only admitted once the
//!   configured interval has elapsed since the last admitted dispatch
//! - **Call Sequencer**: every admitted dispatch gets a generation; a result
//!   whose generation is not newer than the last delivered one is a zombie
//! - **Null means nothing new**: throttled and zombie calls resolve to
//!   `Ok(None)`, while failures of the wrapped read propagate unchanged
//!
//! # Example
//!
//! ```ignore
//! use fetchgate::throttled_fetch;
//!
//! let fetch_state = throttled_fetch(|id: u64| async move { read_state(id).await }, 300);
//!
//! match fetch_state.fetch(42).await? {
//!     Some(state) => render(state),
//!     None => {} // keep what is on screen, poll again next tick
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod sequencer;
pub mod throttle;

pub use config::ThrottleConfig;
pub use coordinator::{FetchFuture, FetchStats, ThrottledFetch, throttled_fetch};
pub use sequencer::{CallSequencer, Freshness, Generation};
pub use throttle::ThrottleGate;

/// Default minimum spacing between admitted dispatches for one key (300ms)
pub const DEFAULT_THROTTLE_INTERVAL_MS: u64 = 300;
