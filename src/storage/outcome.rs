//! Outcome Sinks
//!
//! The write-only log that CRUD outcomes are reported to. The node never reads
//! its own log back; the journal exists for tests and for the HTTP API.

use super::types::{OpKind, Outcome, OutcomeScope};
use crate::replication::types::TxnId;
use crate::ring::types::Address;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Receives one call per operation outcome.
pub trait OutcomeSink: Send + Sync {
    fn record(&self, outcome: Outcome);
}

/// Emits each outcome as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn record(&self, outcome: Outcome) {
        let scope = match outcome.scope {
            OutcomeScope::Replica => "replica",
            OutcomeScope::Quorum => "quorum",
        };
        let status = if outcome.success { "success" } else { "fail" };

        tracing::info!(
            target: "ring_kv::outcome",
            node = %outcome.node,
            scope,
            txn = outcome.txn.0,
            op = %outcome.op,
            key = %outcome.key,
            value = outcome.value.as_deref().unwrap_or(""),
            success = outcome.success,
            "{} {} {}",
            scope,
            outcome.op,
            status
        );
    }
}

/// In-memory outcome log, optionally bounded.
///
/// When full, the oldest outcome is evicted first.
pub struct OutcomeJournal {
    entries: Mutex<VecDeque<Outcome>>,
    capacity: Option<usize>,
}

impl OutcomeJournal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: None,
        })
    }

    pub fn bounded(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: Some(capacity.max(1)),
        })
    }

    pub fn all(&self) -> Vec<Outcome> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// The quorum decision `node` logged for `txn`, if it has been taken.
    pub fn quorum_outcome(&self, node: &Address, txn: TxnId) -> Option<Outcome> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|o| o.is_quorum() && &o.node == node && o.txn == txn)
            .cloned()
    }

    /// Outcomes matching the given scope, operation and status.
    pub fn matching(&self, scope: OutcomeScope, op: OpKind, success: bool) -> Vec<Outcome> {
        self.entries
            .lock()
            .iter()
            .filter(|o| o.scope == scope && o.op == op && o.success == success)
            .cloned()
            .collect()
    }

    pub fn count(&self, scope: OutcomeScope, op: OpKind, success: bool) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|o| o.scope == scope && o.op == op && o.success == success)
            .count()
    }
}

impl OutcomeSink for OutcomeJournal {
    fn record(&self, outcome: Outcome) {
        let mut entries = self.entries.lock();
        if let Some(capacity) = self.capacity {
            while entries.len() >= capacity {
                entries.pop_front();
            }
        }
        entries.push_back(outcome);
    }
}

/// Forwards every outcome to each wrapped sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn OutcomeSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl OutcomeSink for FanoutSink {
    fn record(&self, outcome: Outcome) {
        for sink in &self.sinks {
            sink.record(outcome.clone());
        }
    }
}

/// Passes on quorum decisions only. Keeps a bounded journal from being
/// flooded by the replica outcomes of requests this node merely served.
pub struct QuorumOnly {
    inner: Arc<dyn OutcomeSink>,
}

impl QuorumOnly {
    pub fn new(inner: Arc<dyn OutcomeSink>) -> Self {
        Self { inner }
    }
}

impl OutcomeSink for QuorumOnly {
    fn record(&self, outcome: Outcome) {
        if outcome.is_quorum() {
            self.inner.record(outcome);
        }
    }
}
