//! Error taxonomy shared by every subsystem.
//!
//! None of these terminate the node. Store-level failures become failed
//! replies, stale replies are dropped, and timeouts are folded into quorum
//! evaluation.

use crate::replication::types::TxnId;
use crate::ring::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KvError {
    /// The ring holds fewer members than the replication factor.
    #[error("under-replicated: ring has {members} member(s), {required} required")]
    UnderReplicated { members: usize, required: usize },

    #[error("key already exists: {0}")]
    KeyAlreadyExists(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A reply arrived for a transaction that is no longer tracked.
    #[error("stale transaction {0}")]
    StaleTransaction(TxnId),

    #[error("transaction {0} timed out")]
    Timeout(TxnId),

    #[error("transport: {0}")]
    Transport(String),

    #[error("codec: {0}")]
    Codec(String),

    #[error("unknown peer address: {0}")]
    UnknownPeer(Address),
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Codec(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KvError>;
