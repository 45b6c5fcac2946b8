//! Replication Coordinator
//!
//! Runs both halves of the replication protocol for one node: the client side
//! (fan out, collect replies, decide by quorum) and the server side (apply a
//! request to the local store and answer it).

use super::protocol::{Message, MessageBody};
use super::tracker::TransactionTracker;
use super::types::{TxnId, Verdict};
use crate::clock::Clock;
use crate::error::{KvError, Result};
use crate::ring::{Address, HashRing, REPLICATION_FACTOR};
use crate::storage::{LocalStore, OpKind, Outcome, OutcomeScope, OutcomeSink};
use crate::transport::Transport;

use std::sync::Arc;

pub struct Coordinator {
    local: Address,
    tracker: TransactionTracker,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn OutcomeSink>,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    pub fn new(
        local: Address,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn OutcomeSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            local,
            tracker: TransactionTracker::default(),
            transport,
            sink,
            clock,
        }
    }

    // --- Client side ---

    /// Fans `op` on `key` out to the key's three replicas.
    ///
    /// Returns as soon as the requests are handed to the transport; the
    /// outcome is decided later as replies come in. `value` is only sent for
    /// CREATE and UPDATE.
    pub fn submit(
        &mut self,
        ring: &HashRing,
        op: OpKind,
        key: &str,
        value: Option<&str>,
    ) -> Result<TxnId> {
        let replicas = ring.find_replicas(key).ok_or(KvError::UnderReplicated {
            members: ring.len(),
            required: REPLICATION_FACTOR,
        })?;

        let value = match op {
            OpKind::Create | OpKind::Update => Some(value.unwrap_or_default()),
            OpKind::Read | OpKind::Delete => None,
        };

        let txn = self.tracker.begin(op, key, value, self.clock.now());

        for (role, entry) in replicas.iter() {
            let message = Message::new(
                txn,
                self.local.clone(),
                MessageBody::request(op, key, value, role),
            );
            self.send(&entry.address, &message);
        }

        tracing::debug!(
            "Submitted {} {} as txn {} to {:?}",
            op,
            key,
            txn,
            replicas.addresses()
        );

        Ok(txn)
    }

    /// Counts a reply and re-evaluates its transaction.
    ///
    /// Replies for transactions that already reached a verdict are dropped.
    pub fn on_reply(
        &mut self,
        txn: TxnId,
        succeeded: bool,
        value: Option<String>,
    ) -> Option<Verdict> {
        match self.tracker.record_response(txn, succeeded, value) {
            Ok(_) => self.evaluate_quorum(txn),
            Err(e) => {
                tracing::debug!("Dropping reply: {}", e);
                None
            }
        }
    }

    /// Forces a verdict on every transaction older than `timeout` rounds.
    pub fn sweep(&mut self, timeout: u64) -> Vec<(TxnId, Verdict)> {
        let overdue = self.tracker.sweep_timeouts(self.clock.now(), timeout);

        overdue
            .into_iter()
            .filter_map(|txn| {
                tracing::warn!("{}", KvError::Timeout(txn));
                self.evaluate_quorum(txn).map(|verdict| (txn, verdict))
            })
            .collect()
    }

    /// Applies the 2-of-3 rule to a live transaction.
    ///
    /// A committed or failed transaction is logged as a quorum outcome and
    /// removed. Returns `None` if the id is not tracked.
    pub fn evaluate_quorum(&mut self, txn: TxnId) -> Option<Verdict> {
        let verdict = self.tracker.get(txn)?.verdict();
        if verdict == Verdict::Pending {
            return Some(verdict);
        }

        let finished = self.tracker.finish(txn)?;
        let success = verdict == Verdict::Committed;
        let value = match (finished.op, success) {
            (OpKind::Delete, _) | (OpKind::Read, false) => None,
            _ => finished.value,
        };

        tracing::debug!(
            "Txn {} {} {} with {}/{} successful replies",
            txn,
            finished.op,
            if success { "committed" } else { "failed" },
            finished.success_responses,
            finished.total_responses
        );

        self.sink.record(Outcome {
            node: self.local.clone(),
            scope: OutcomeScope::Quorum,
            txn,
            op: finished.op,
            key: finished.key,
            value,
            success,
        });

        Some(verdict)
    }

    // --- Server side ---

    pub fn serve_create(
        &self,
        store: &mut LocalStore,
        origin: &Address,
        txn: TxnId,
        key: &str,
        value: &str,
    ) {
        let success = store.create(txn, key, value).is_ok();
        self.reply(origin, txn, MessageBody::Reply { success });
    }

    /// Answers with the stored value, or no value on a miss.
    pub fn serve_read(&self, store: &LocalStore, origin: &Address, txn: TxnId, key: &str) {
        let value = store.read(txn, key).ok();
        self.reply(origin, txn, MessageBody::ReadReply { value });
    }

    pub fn serve_update(
        &self,
        store: &mut LocalStore,
        origin: &Address,
        txn: TxnId,
        key: &str,
        value: &str,
    ) {
        let success = store.update(txn, key, value).is_ok();
        self.reply(origin, txn, MessageBody::Reply { success });
    }

    pub fn serve_delete(&self, store: &mut LocalStore, origin: &Address, txn: TxnId, key: &str) {
        let success = store.delete(txn, key).is_ok();
        self.reply(origin, txn, MessageBody::Reply { success });
    }

    fn reply(&self, origin: &Address, txn: TxnId, body: MessageBody) {
        let message = Message::new(txn, self.local.clone(), body);
        self.send(origin, &message);
    }

    fn send(&self, to: &Address, message: &Message) {
        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode message for txn {}: {}", message.txn, e);
                return;
            }
        };

        if let Err(e) = self.transport.send(&self.local, to, payload) {
            tracing::warn!("Failed to send txn {} to {}: {}", message.txn, to, e);
        }
    }

    // --- Accessors ---

    pub fn local(&self) -> &Address {
        &self.local
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_pending(&self, txn: TxnId) -> bool {
        self.tracker.contains(txn)
    }

    pub fn tracker(&self) -> &TransactionTracker {
        &self.tracker
    }
}
