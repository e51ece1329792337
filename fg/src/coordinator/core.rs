//! ThrottledFetch implementation

use std::fmt;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ThrottleConfig;
use crate::sequencer::{CallSequencer, Freshness};
use crate::throttle::ThrottleGate;

use super::stats::FetchStats;

/// Future returned by [`ThrottledFetch::fetch`].
///
/// Resolves to `Ok(Some(value))` for a fresh result, `Ok(None)` when the call
/// was throttled or its result was a zombie, and `Err(e)` when the underlying
/// read failed.
pub type FetchFuture<T, E> = BoxFuture<'static, Result<Option<T>, E>>;

type ReadOp<K, T, E> = dyn Fn(K) -> BoxFuture<'static, Result<T, E>> + Send + Sync;

/// Per-key state, protected by mutex. Never held across an await.
struct CoordinatorState<K> {
    gate: ThrottleGate<K>,
    sequencer: CallSequencer<K>,
    stats: FetchStats,
}

fn lock<K>(state: &Mutex<CoordinatorState<K>>) -> MutexGuard<'_, CoordinatorState<K>> {
    // Every critical section leaves the state consistent, so a poisoned lock is still usable
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wraps a keyed async read with per-key throttling and zombie filtering.
///
/// Each instance owns its own per-key state; two coordinators never share
/// state even when used with the same key. Clones share state.
pub struct ThrottledFetch<K, T, E> {
    op: Arc<ReadOp<K, T, E>>,
    state: Arc<Mutex<CoordinatorState<K>>>,
}

impl<K, T, E> Clone for ThrottledFetch<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            op: Arc::clone(&self.op),
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, T, E> fmt::Debug for ThrottledFetch<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledFetch").finish_non_exhaustive()
    }
}

impl<K, T, E> ThrottledFetch<K, T, E>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wrap `op` using the given throttle configuration
    pub fn new<F, Fut>(op: F, config: ThrottleConfig) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_interval(op, config.interval())
    }

    /// Wrap `op` with the same throttle interval for every key
    pub fn with_interval<F, Fut>(op: F, interval: Duration) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        debug!(?interval, "ThrottledFetch::with_interval: called");
        let op: Arc<ReadOp<K, T, E>> = Arc::new(move |key: K| op(key).boxed());

        Self {
            op,
            state: Arc::new(Mutex::new(CoordinatorState {
                gate: ThrottleGate::new(interval),
                sequencer: CallSequencer::new(),
                stats: FetchStats::default(),
            })),
        }
    }

    /// Use a different throttle interval for one key.
    ///
    /// Only applies to a fresh coordinator: once it has been cloned or has
    /// seen a call, intervals are fixed and the override is ignored.
    pub fn with_key_interval(mut self, key: K, interval: Duration) -> Self {
        match Arc::get_mut(&mut self.state) {
            Some(state) => {
                let state = state.get_mut().unwrap_or_else(PoisonError::into_inner);
                if state.stats.total_calls() == 0 {
                    state.gate.set_key_interval(key, interval);
                } else {
                    warn!(?key, "ThrottledFetch::with_key_interval: calls already made, override ignored");
                }
            }
            None => warn!(?key, "ThrottledFetch::with_key_interval: coordinator is shared, override ignored"),
        }
        self
    }

    /// Read `key` through the coordinator.
    ///
    /// Admission, generation assignment and the call into the underlying read
    /// all happen here, before the returned future is first polled, so the
    /// order of `fetch` calls is the order used to detect zombies.
    pub fn fetch(&self, key: K) -> FetchFuture<T, E> {
        debug!(?key, "ThrottledFetch::fetch: called");

        let generation = {
            let mut state = lock(&self.state);
            if !state.gate.admit(&key, Instant::now()) {
                state.stats.throttled += 1;
                debug!(?key, "ThrottledFetch::fetch: throttled");
                return future::ready(Ok(None)).boxed();
            }
            state.stats.dispatched += 1;
            state.sequencer.begin_call(&key)
        };

        let pending = (self.op)(key.clone());
        let state = Arc::clone(&self.state);

        async move {
            let result = pending.await;

            let mut state = lock(&state);
            match result {
                Ok(value) => match state.sequencer.accept_if_fresh(&key, generation, value) {
                    Freshness::Fresh(value) => {
                        state.stats.delivered += 1;
                        Ok(Some(value))
                    }
                    Freshness::Zombie => {
                        state.stats.zombies += 1;
                        debug!(?key, %generation, "ThrottledFetch::fetch: discarded zombie result");
                        Ok(None)
                    }
                },
                Err(e) => {
                    state.stats.failed += 1;
                    debug!(?key, %generation, "ThrottledFetch::fetch: underlying read failed");
                    Err(e)
                }
            }
        }
        .boxed()
    }

    /// Snapshot of the coordinator's counters
    pub fn stats(&self) -> FetchStats {
        lock(&self.state).stats
    }
}

/// Wrap `op` so that reads for the same key are at least
/// `throttle_interval_ms` apart and never deliver stale results.
pub fn throttled_fetch<K, T, E, F, Fut>(op: F, throttle_interval_ms: u64) -> ThrottledFetch<K, T, E>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    ThrottledFetch::new(op, ThrottleConfig::from_millis(throttle_interval_ms))
}
