use crate::ring::types::REPLICATION_FACTOR;
use crate::storage::types::OpKind;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Successful replies needed to commit a transaction.
pub const QUORUM: usize = 2;

/// Per-node transaction identifier, allocated in increasing order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side bookkeeping for one fanned-out request.
///
/// `value` starts as the value being written (CREATE/UPDATE) and, for READ,
/// is filled in by the successful replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxnId,
    pub op: OpKind,
    pub key: String,
    pub value: Option<String>,
    pub total_responses: usize,
    pub success_responses: usize,
    /// Round in which the request was sent.
    pub started_at: u64,
}

/// Where a transaction stands against the 2-of-3 quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pending,
    Committed,
    Failed,
}

impl Transaction {
    pub fn new(id: TxnId, op: OpKind, key: String, value: Option<String>, started_at: u64) -> Self {
        Self {
            id,
            op,
            key,
            value,
            total_responses: 0,
            success_responses: 0,
            started_at,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.success_responses >= QUORUM {
            Verdict::Committed
        } else if self.total_responses >= REPLICATION_FACTOR {
            Verdict::Failed
        } else {
            Verdict::Pending
        }
    }

    pub fn is_overdue(&self, now: u64, timeout: u64) -> bool {
        now.saturating_sub(self.started_at) > timeout
    }
}
