//! Call sequencer
//!
//! Assigns each admitted dispatch for a key a generation in initiation order
//! and remembers, per key, the generation of the latest delivered result.
//! A result whose generation is not newer than that is a zombie.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

/// Initiation order of a call for one key. The first call is generation 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The raw generation number
    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of the freshness check on a completed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness<T> {
    /// Newer than anything delivered so far; deliver it
    Fresh(T),

    /// Superseded by an already-delivered later call; discard it
    Zombie,
}

impl<T> Freshness<T> {
    /// Returns true if this result was discarded
    pub fn is_zombie(&self) -> bool {
        matches!(self, Freshness::Zombie)
    }

    /// The value to deliver, if any
    pub fn into_option(self) -> Option<T> {
        match self {
            Freshness::Fresh(value) => Some(value),
            Freshness::Zombie => None,
        }
    }
}

#[derive(Debug, Default)]
struct KeySequence {
    /// Last generation handed out
    issued: Generation,

    /// Generation of the latest delivered result
    accepted: Option<Generation>,
}

/// Per-key generation bookkeeping
#[derive(Debug)]
pub struct CallSequencer<K> {
    keys: HashMap<K, KeySequence>,
}

impl<K> Default for CallSequencer<K> {
    fn default() -> Self {
        Self { keys: HashMap::new() }
    }
}

impl<K> CallSequencer<K>
where
    K: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next generation for `key`.
    ///
    /// Must run at dispatch time, before the read is awaited, so concurrent
    /// calls get generations in the order they were started.
    pub fn begin_call(&mut self, key: &K) -> Generation {
        let seq = self.keys.entry(key.clone()).or_default();
        seq.issued = seq.issued.next();
        debug!(?key, generation = %seq.issued, "CallSequencer::begin_call: issued");
        seq.issued
    }

    /// Check a completed call against the latest delivered generation.
    ///
    /// Equal generations count as zombies: a generation is delivered at most once.
    pub fn accept_if_fresh<T>(&mut self, key: &K, generation: Generation, value: T) -> Freshness<T> {
        let seq = self.keys.entry(key.clone()).or_default();

        if Some(generation) <= seq.accepted {
            debug!(?key, %generation, accepted = ?seq.accepted, "CallSequencer::accept_if_fresh: zombie");
            return Freshness::Zombie;
        }

        debug!(?key, %generation, "CallSequencer::accept_if_fresh: fresh");
        seq.accepted = Some(generation);
        Freshness::Fresh(value)
    }

    /// Generation of the latest delivered result for `key`
    pub fn accepted(&self, key: &K) -> Option<Generation> {
        self.keys.get(key).and_then(|seq| seq.accepted)
    }
}
