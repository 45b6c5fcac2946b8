use crate::error::KvError;
use crate::replication::types::TxnId;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn: Option<TxnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitResponse {
    pub fn accepted(txn: TxnId) -> Self {
        Self {
            txn: Some(txn),
            error: None,
        }
    }

    pub fn rejected(error: &KvError) -> Self {
        Self {
            txn: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnState {
    Pending,
    Committed,
    Failed,
    /// Never issued by this node, or evicted from the journal.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnResponse {
    pub txn: TxnId,
    pub state: TxnState,
    /// Value read by a committed READ, or written by a committed CREATE/UPDATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembersRequest {
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembersResponse {
    pub members: usize,
}
