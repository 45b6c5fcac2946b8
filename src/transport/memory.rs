use super::Transport;
use crate::error::Result;
use crate::ring::types::Address;

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for everything that passed through the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub sent: u64,
    pub delivered: u64,
    pub dropped: u64,
}

/// Emulated network connecting every node in the process.
///
/// Each destination has its own FIFO queue. Messages to or from a failed
/// address are lost, as is a random fraction of all traffic when a drop
/// probability is set.
pub struct InMemoryNetwork {
    queues: DashMap<Address, VecDeque<Vec<u8>>>,
    failed: DashSet<Address>,
    drop_probability: RwLock<f64>,
    sent: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl InMemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queues: DashMap::new(),
            failed: DashSet::new(),
            drop_probability: RwLock::new(0.0),
            sent: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Cuts `address` off: its queued messages are discarded and all future
    /// traffic to or from it is dropped.
    pub fn fail(&self, address: &Address) {
        tracing::info!("Network: failing {}", address);
        self.failed.insert(address.clone());
        if let Some((_, queue)) = self.queues.remove(address) {
            self.dropped.fetch_add(queue.len() as u64, Ordering::Relaxed);
        }
    }

    pub fn recover(&self, address: &Address) {
        tracing::info!("Network: recovering {}", address);
        self.failed.remove(address);
    }

    pub fn is_failed(&self, address: &Address) -> bool {
        self.failed.contains(address)
    }

    /// Sets the probability, clamped to `[0, 1]`, that any message is lost.
    pub fn set_drop_probability(&self, probability: f64) {
        *self.drop_probability.write() = probability.clamp(0.0, 1.0);
    }

    /// Messages waiting for `address`.
    pub fn queued(&self, address: &Address) -> usize {
        self.queues.get(address).map(|q| q.len()).unwrap_or(0)
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            sent: self.sent.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn should_drop(&self, from: &Address, to: &Address) -> bool {
        if self.failed.contains(from) || self.failed.contains(to) {
            return true;
        }

        let probability = *self.drop_probability.read();
        probability > 0.0 && rand::random::<f64>() < probability
    }
}

impl Transport for InMemoryNetwork {
    fn send(&self, from: &Address, to: &Address, payload: String) -> Result<()> {
        self.sent.fetch_add(1, Ordering::Relaxed);

        if self.should_drop(from, to) {
            tracing::trace!("Network: dropped message {} -> {}", from, to);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        self.queues
            .entry(to.clone())
            .or_default()
            .push_back(payload.into_bytes());
        Ok(())
    }

    fn receive(&self, local: &Address) -> Vec<Vec<u8>> {
        if self.failed.contains(local) {
            return Vec::new();
        }

        let drained: Vec<Vec<u8>> = match self.queues.get_mut(local) {
            Some(mut queue) => queue.drain(..).collect(),
            None => Vec::new(),
        };

        self.delivered
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained
    }
}
