use crate::replication::types::TxnId;
use crate::ring::types::Address;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four client-visible operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OpKind {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Create => "CREATE",
            OpKind::Read => "READ",
            OpKind::Update => "UPDATE",
            OpKind::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Whether an outcome describes one replica's local table or the
/// coordinator's 2-of-3 decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OutcomeScope {
    Replica,
    Quorum,
}

/// One logged operation outcome.
///
/// `value` is present for CREATE and UPDATE, and for a successful READ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    pub node: Address,
    pub scope: OutcomeScope,
    pub txn: TxnId,
    pub op: OpKind,
    pub key: String,
    pub value: Option<String>,
    pub success: bool,
}

impl Outcome {
    pub fn is_quorum(&self) -> bool {
        self.scope == OutcomeScope::Quorum
    }
}
