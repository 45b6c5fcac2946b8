use crate::clock::{Clock, RoundClock};
use crate::membership::SharedMembership;
use crate::node::{DispatchReport, Node};
use crate::ring::{Address, REPLICATION_FACTOR};
use crate::storage::OutcomeJournal;
use crate::transport::InMemoryNetwork;

use std::sync::Arc;

/// N nodes sharing one network, one membership snapshot, one clock and one
/// outcome journal.
pub struct Cluster {
    network: Arc<InMemoryNetwork>,
    membership: Arc<SharedMembership>,
    clock: Arc<RoundClock>,
    journal: Arc<OutcomeJournal>,
    nodes: Vec<Node>,
}

impl Cluster {
    /// Builds `size` nodes named `node-0`, `node-1`, ... and gives each its
    /// initial ring.
    pub fn new(size: usize, timeout: u64) -> Self {
        let addresses = (0..size)
            .map(|i| Address::new(format!("node-{}", i)))
            .collect();
        Self::with_addresses(addresses, timeout)
    }

    pub fn with_addresses(addresses: Vec<Address>, timeout: u64) -> Self {
        let network = InMemoryNetwork::new();
        let membership = SharedMembership::new(addresses.clone());
        let clock = RoundClock::new();
        let journal = OutcomeJournal::new();

        let mut nodes: Vec<Node> = addresses
            .into_iter()
            .map(|address| {
                Node::new(
                    address,
                    network.clone(),
                    membership.clone(),
                    journal.clone(),
                    clock.clone(),
                    timeout,
                )
            })
            .collect();

        for node in nodes.iter_mut() {
            node.stabilize();
        }

        tracing::info!("Simulation cluster started with {} node(s)", nodes.len());

        Self {
            network,
            membership,
            clock,
            journal,
            nodes,
        }
    }

    // ============================================================
    // DRIVING
    // ============================================================

    /// Advances the clock and ticks every node once.
    pub fn run_round(&mut self) -> DispatchReport {
        let round = self.clock.advance();
        let mut report = DispatchReport::default();

        for node in self.nodes.iter_mut().filter(|n| !n.is_failed()) {
            report.merge(&node.tick());
        }

        tracing::debug!("Round {} finished: {:?}", round, report);
        report
    }

    pub fn run_rounds(&mut self, rounds: usize) -> DispatchReport {
        let mut total = DispatchReport::default();
        for _ in 0..rounds {
            total.merge(&self.run_round());
        }
        total
    }

    // ============================================================
    // FAILURES
    // ============================================================

    /// Crash-stops node `index`. Membership still lists it until
    /// `remove_member` is called.
    pub fn fail_node(&mut self, index: usize) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.fail();
        self.network.fail(node.address());
    }

    /// Drops node `index` from the membership snapshot, as a failure detector
    /// would. Live nodes pick it up on their next stabilize.
    pub fn remove_member(&mut self, index: usize) -> bool {
        match self.nodes.get(index) {
            Some(node) => self.membership.remove(node.address()),
            None => false,
        }
    }

    // ============================================================
    // INSPECTION
    // ============================================================

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.nodes.iter().position(|n| n.address() == address)
    }

    /// Indices of `key`'s primary, secondary and tertiary, as seen by the
    /// first live node.
    pub fn replica_indices(&self, key: &str) -> Option<[usize; REPLICATION_FACTOR]> {
        let observer = self.nodes.iter().find(|n| !n.is_failed())?;
        let replicas = observer.ring().find_replicas(key)?;
        let [primary, secondary, tertiary] = replicas.addresses();

        Some([
            self.index_of(primary)?,
            self.index_of(secondary)?,
            self.index_of(tertiary)?,
        ])
    }

    /// Indices of live nodes whose local store holds `key`.
    pub fn holders(&self, key: &str) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.is_failed() && n.store().get(key).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn round(&self) -> u64 {
        self.clock.now()
    }

    pub fn journal(&self) -> &Arc<OutcomeJournal> {
        &self.journal
    }

    pub fn network(&self) -> &Arc<InMemoryNetwork> {
        &self.network
    }

    pub fn membership(&self) -> &Arc<SharedMembership> {
        &self.membership
    }
}
