//! Stabilization Engine
//!
//! Keeps copies of this node's data on its two ring successors. Runs after
//! every ring refresh and does nothing unless the successor pair changed.

use super::coordinator::Coordinator;
use crate::ring::{Address, HashRing, REPLICATION_FACTOR};
use crate::storage::{LocalStore, OpKind};

#[derive(Debug, Default)]
pub struct Stabilizer {
    /// Successor pair recorded by the last successful run.
    replicas: Option<[Address; 2]>,
}

impl Stabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-replicates the local store if this node's successors changed.
    ///
    /// Every local entry is re-submitted as a CREATE through the normal
    /// fan-out path, so re-replication is quorum-tracked and logged like any
    /// client request. Returns the number of submissions issued.
    pub fn on_ring_refresh(
        &mut self,
        ring: &HashRing,
        local: &Address,
        store: &LocalStore,
        coordinator: &mut Coordinator,
    ) -> usize {
        if ring.len() < REPLICATION_FACTOR {
            tracing::debug!(
                "Skipping stabilization: ring has {} member(s)",
                ring.len()
            );
            return 0;
        }

        let Some(successors) = ring.successors_of(local) else {
            tracing::debug!("Skipping stabilization: {} is not on the ring", local);
            return 0;
        };

        if self.replicas.as_ref() == Some(&successors) {
            return 0;
        }

        tracing::info!(
            "Successors of {} changed {:?} -> {:?}, re-replicating {} key(s)",
            local,
            self.replicas,
            successors,
            store.len()
        );

        let mut submitted = 0;
        for (key, value) in store.snapshot() {
            match coordinator.submit(ring, OpKind::Create, &key, Some(&value)) {
                Ok(_) => submitted += 1,
                Err(e) => tracing::warn!("Failed to re-replicate {}: {}", key, e),
            }
        }

        self.replicas = Some(successors);
        submitted
    }

    pub fn replicas(&self) -> Option<&[Address; 2]> {
        self.replicas.as_ref()
    }
}
