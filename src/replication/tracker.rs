//! Transaction Tracker
//!
//! Sole owner of in-flight transactions. Other components refer to a
//! transaction by id only and never hold on to it across calls.

use super::types::{Transaction, TxnId};
use crate::error::{KvError, Result};
use crate::ring::types::REPLICATION_FACTOR;
use crate::storage::types::OpKind;

use std::collections::BTreeMap;

pub struct TransactionTracker {
    next_id: u64,
    live: BTreeMap<TxnId, Transaction>,
}

impl TransactionTracker {
    /// Starts numbering at `first_id`.
    pub fn new(first_id: u64) -> Self {
        Self {
            next_id: first_id,
            live: BTreeMap::new(),
        }
    }

    /// Opens a transaction with zero responses, stamped with `now`.
    pub fn begin(&mut self, op: OpKind, key: &str, value: Option<&str>, now: u64) -> TxnId {
        let id = TxnId(self.next_id);
        self.next_id += 1;

        self.live.insert(
            id,
            Transaction::new(id, op, key.to_string(), value.map(str::to_string), now),
        );

        tracing::trace!("Opened transaction {} ({} {})", id, op, key);
        id
    }

    /// Counts one reply against a live transaction.
    ///
    /// A successful READ reply also stores the value it carried. Replies for
    /// unknown ids yield `StaleTransaction` and change nothing.
    pub fn record_response(
        &mut self,
        id: TxnId,
        succeeded: bool,
        value: Option<String>,
    ) -> Result<&Transaction> {
        let txn = self
            .live
            .get_mut(&id)
            .ok_or(KvError::StaleTransaction(id))?;

        if txn.total_responses < REPLICATION_FACTOR {
            txn.total_responses += 1;
        }

        if succeeded && txn.success_responses < txn.total_responses {
            txn.success_responses += 1;
            if txn.op == OpKind::Read && value.is_some() {
                txn.value = value;
            }
        }

        Ok(txn)
    }

    /// Marks every transaction older than `timeout` as fully answered.
    ///
    /// Missing replies count as non-responses, so each returned transaction is
    /// ready for a final quorum decision. Ids come back in ascending order.
    pub fn sweep_timeouts(&mut self, now: u64, timeout: u64) -> Vec<TxnId> {
        self.live
            .values_mut()
            .filter(|txn| txn.is_overdue(now, timeout))
            .map(|txn| {
                txn.total_responses = REPLICATION_FACTOR;
                txn.id
            })
            .collect()
    }

    pub fn get(&self, id: TxnId) -> Option<&Transaction> {
        self.live.get(&id)
    }

    /// Removes a transaction. This is the only way one is destroyed.
    pub fn finish(&mut self, id: TxnId) -> Option<Transaction> {
        self.live.remove(&id)
    }

    pub fn contains(&self, id: TxnId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn next_id(&self) -> TxnId {
        TxnId(self.next_id)
    }
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new(1)
    }
}
