use crate::replication::types::{TxnId, Verdict};
use crate::ring::types::{Address, RingEntry};

use serde::Serialize;

/// What one `process` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// CREATE/READ/UPDATE/DELETE requests applied locally and answered.
    pub requests_served: usize,
    /// REPLY/READREPLY messages counted against a live transaction.
    pub replies_counted: usize,
    /// Replies for transactions that were already decided.
    pub stale_replies: usize,
    /// Inbound buffers that did not decode.
    pub malformed: usize,
    /// Transactions forced to a verdict by the timeout sweep.
    pub timed_out: usize,
    pub committed: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub(crate) fn tally(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Committed => self.committed += 1,
            Verdict::Failed => self.failed += 1,
            Verdict::Pending => {}
        }
    }

    /// Adds another report's counters into this one.
    pub fn merge(&mut self, other: &DispatchReport) {
        self.requests_served += other.requests_served;
        self.replies_counted += other.replies_counted;
        self.stale_replies += other.stale_replies;
        self.malformed += other.malformed;
        self.timed_out += other.timed_out;
        self.committed += other.committed;
        self.failed += other.failed;
    }
}

/// Point-in-time view of a node, served by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub address: Address,
    pub ring: Vec<RingEntry>,
    pub successors: Option<[Address; 2]>,
    pub pending_transactions: usize,
    pub local_keys: usize,
    pub next_txn: TxnId,
    pub failed: bool,
}
