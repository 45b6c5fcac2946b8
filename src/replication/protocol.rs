//! Replication Wire Protocol
//!
//! One message type carries requests (CREATE/READ/UPDATE/DELETE) from a
//! coordinator to a replica and replies (REPLY/READREPLY) back. Messages are
//! encoded as JSON strings; field order on the wire does not matter.

use super::types::TxnId;
use crate::error::Result;
use crate::ring::types::{Address, ReplicaRole};
use crate::storage::types::OpKind;

use serde::{Deserialize, Serialize};

/// A message in flight between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Transaction id allocated by the coordinator; echoed by the reply.
    pub txn: TxnId,
    /// Address replies are sent back to.
    pub from: Address,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum MessageBody {
    Create {
        key: String,
        value: String,
        role: ReplicaRole,
    },
    Read {
        key: String,
        role: ReplicaRole,
    },
    Update {
        key: String,
        value: String,
        role: ReplicaRole,
    },
    Delete {
        key: String,
        role: ReplicaRole,
    },
    /// Answer to CREATE, UPDATE and DELETE.
    Reply { success: bool },
    /// Answer to READ. `None` means the replica does not hold the key.
    ReadReply {
        #[serde(default)]
        value: Option<String>,
    },
}

impl MessageBody {
    /// Builds the request a coordinator sends to the replica in `role`.
    pub fn request(op: OpKind, key: &str, value: Option<&str>, role: ReplicaRole) -> Self {
        let key = key.to_string();
        let value = value.unwrap_or_default().to_string();
        match op {
            OpKind::Create => MessageBody::Create { key, value, role },
            OpKind::Read => MessageBody::Read { key, role },
            OpKind::Update => MessageBody::Update { key, value, role },
            OpKind::Delete => MessageBody::Delete { key, role },
        }
    }

    /// The operation a request asks for; `None` for replies.
    pub fn op(&self) -> Option<OpKind> {
        match self {
            MessageBody::Create { .. } => Some(OpKind::Create),
            MessageBody::Read { .. } => Some(OpKind::Read),
            MessageBody::Update { .. } => Some(OpKind::Update),
            MessageBody::Delete { .. } => Some(OpKind::Delete),
            MessageBody::Reply { .. } | MessageBody::ReadReply { .. } => None,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.op().is_none()
    }
}

impl Message {
    pub fn new(txn: TxnId, from: Address, body: MessageBody) -> Self {
        Self { txn, from, body }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}
