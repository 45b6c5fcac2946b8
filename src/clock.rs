//! Logical time.
//!
//! Transactions are timed in scheduler rounds rather than wall-clock
//! milliseconds: the driver advances the clock once per round and the timeout
//! sweep compares round numbers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Round counter shared by every node driven from the same scheduler.
#[derive(Debug, Default)]
pub struct RoundClock {
    round: AtomicU64,
}

impl RoundClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Moves to the next round and returns it.
    pub fn advance(&self) -> u64 {
        self.round.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn set(&self, round: u64) {
        self.round.store(round, Ordering::SeqCst);
    }
}

impl Clock for RoundClock {
    fn now(&self) -> u64 {
        self.round.load(Ordering::SeqCst)
    }
}
