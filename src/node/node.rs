use super::types::{DispatchReport, NodeStatus};
use crate::clock::Clock;
use crate::error::{KvError, Result};
use crate::membership::MembershipView;
use crate::replication::{Coordinator, Message, MessageBody, Stabilizer, TxnId};
use crate::ring::{Address, HashRing};
use crate::storage::{LocalStore, OpKind, OutcomeSink};
use crate::transport::Transport;

use std::collections::VecDeque;
use std::sync::Arc;

pub struct Node {
    address: Address,
    ring: HashRing,
    store: LocalStore,
    coordinator: Coordinator,
    stabilizer: Stabilizer,
    inbound: VecDeque<Vec<u8>>,
    transport: Arc<dyn Transport>,
    membership: Arc<dyn MembershipView>,
    /// Rounds a transaction may wait for replies before it is forced to a verdict.
    timeout: u64,
    failed: bool,
}

impl Node {
    pub fn new(
        address: Address,
        transport: Arc<dyn Transport>,
        membership: Arc<dyn MembershipView>,
        sink: Arc<dyn OutcomeSink>,
        clock: Arc<dyn Clock>,
        timeout: u64,
    ) -> Self {
        Self {
            store: LocalStore::new(address.clone(), sink.clone()),
            coordinator: Coordinator::new(address.clone(), transport.clone(), sink, clock),
            address,
            ring: HashRing::new(),
            stabilizer: Stabilizer::new(),
            inbound: VecDeque::new(),
            transport,
            membership,
            timeout,
            failed: false,
        }
    }

    // ============================================================
    // CLIENT API
    // ============================================================

    pub fn client_create(&mut self, key: &str, value: &str) -> Result<TxnId> {
        self.submit(OpKind::Create, key, Some(value))
    }

    pub fn client_read(&mut self, key: &str) -> Result<TxnId> {
        self.submit(OpKind::Read, key, None)
    }

    pub fn client_update(&mut self, key: &str, value: &str) -> Result<TxnId> {
        self.submit(OpKind::Update, key, Some(value))
    }

    pub fn client_delete(&mut self, key: &str) -> Result<TxnId> {
        self.submit(OpKind::Delete, key, None)
    }

    /// Fans a request out to the key's replicas. Fails with `UnderReplicated`
    /// while the ring has fewer than three members; retrying is up to the caller.
    /// A failed node refuses every request.
    pub fn submit(&mut self, op: OpKind, key: &str, value: Option<&str>) -> Result<TxnId> {
        self.ensure_alive()?;
        self.coordinator.submit(&self.ring, op, key, value)
    }

    // ============================================================
    // SCHEDULER HOOKS
    // ============================================================

    /// Runs one full round: receive, process, stabilize.
    pub fn tick(&mut self) -> DispatchReport {
        self.receive();
        let report = self.process();
        self.stabilize();
        report
    }

    /// Queues everything the transport holds for this node.
    pub fn receive(&mut self) -> usize {
        if self.failed {
            return 0;
        }

        let received = self.transport.receive(&self.address);
        let count = received.len();
        self.inbound.extend(received);
        count
    }

    /// Drains the inbound queue, then sweeps overdue transactions.
    pub fn process(&mut self) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.failed {
            return report;
        }

        while let Some(raw) = self.inbound.pop_front() {
            match Message::decode(&raw) {
                Ok(message) => self.dispatch(message, &mut report),
                Err(e) => {
                    tracing::warn!("Discarding malformed message on {}: {}", self.address, e);
                    report.malformed += 1;
                }
            }
        }

        for (_, verdict) in self.coordinator.sweep(self.timeout) {
            report.timed_out += 1;
            report.tally(verdict);
        }

        report
    }

    /// Refreshes the ring from membership and runs stabilization.
    ///
    /// Returns the number of CREATE re-submissions issued.
    pub fn stabilize(&mut self) -> usize {
        if self.failed {
            return 0;
        }

        if self.ring.refresh(self.membership.live_members()) {
            tracing::info!(
                "Ring on {} now has {} member(s)",
                self.address,
                self.ring.len()
            );
        }

        self.stabilizer.on_ring_refresh(
            &self.ring,
            &self.address,
            &self.store,
            &mut self.coordinator,
        )
    }

    fn dispatch(&mut self, message: Message, report: &mut DispatchReport) {
        let Message { txn, from, body } = message;

        match body {
            MessageBody::Create { key, value, .. } => {
                self.coordinator
                    .serve_create(&mut self.store, &from, txn, &key, &value);
                report.requests_served += 1;
            }
            MessageBody::Read { key, .. } => {
                self.coordinator.serve_read(&self.store, &from, txn, &key);
                report.requests_served += 1;
            }
            MessageBody::Update { key, value, .. } => {
                self.coordinator
                    .serve_update(&mut self.store, &from, txn, &key, &value);
                report.requests_served += 1;
            }
            MessageBody::Delete { key, .. } => {
                self.coordinator
                    .serve_delete(&mut self.store, &from, txn, &key);
                report.requests_served += 1;
            }
            MessageBody::Reply { success } => {
                self.count_reply(txn, success, None, report);
            }
            MessageBody::ReadReply { value } => {
                self.count_reply(txn, value.is_some(), value, report);
            }
        }
    }

    fn count_reply(
        &mut self,
        txn: TxnId,
        success: bool,
        value: Option<String>,
        report: &mut DispatchReport,
    ) {
        match self.coordinator.on_reply(txn, success, value) {
            Some(verdict) => {
                report.replies_counted += 1;
                report.tally(verdict);
            }
            None => report.stale_replies += 1,
        }
    }

    // ============================================================
    // FAILURE INJECTION & INSPECTION
    // ============================================================

    /// Crash-stops the node: it stops receiving, processing and stabilizing.
    pub fn fail(&mut self) {
        tracing::warn!("Node {} failed", self.address);
        self.failed = true;
        self.inbound.clear();
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn successors(&self) -> Option<&[Address; 2]> {
        self.stabilizer.replicas()
    }

    pub fn is_pending(&self, txn: TxnId) -> bool {
        self.coordinator.is_pending(txn)
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            address: self.address.clone(),
            ring: self.ring.entries().to_vec(),
            successors: self.stabilizer.replicas().cloned(),
            pending_transactions: self.coordinator.pending(),
            local_keys: self.store.len(),
            next_txn: self.coordinator.tracker().next_id(),
            failed: self.failed,
        }
    }

    /// Error a caller gets for a request on a failed node.
    pub fn ensure_alive(&self) -> Result<()> {
        if self.failed {
            return Err(KvError::Transport(format!("node {} has failed", self.address)));
        }
        Ok(())
    }
}
