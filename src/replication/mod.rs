//! Replication Coordination Module
//!
//! Fans every CRUD request out to the three replicas of its key and decides
//! the request's fate by 2-of-3 quorum.
//!
//! ## Architecture Overview
//! 1. **Submission**: `Coordinator::submit` derives the replica set from the
//!    ring, opens a `Transaction` in the `TransactionTracker` and sends one
//!    request per replica role. Sends are fire-and-forget.
//! 2. **Serving**: Replicas apply the request to their `LocalStore` and send a
//!    single reply carrying the same transaction id.
//! 3. **Quorum**: Every reply, and every timeout, re-evaluates the transaction.
//!    Two successes commit it; three responses without two successes fail it.
//!    Either way the transaction is removed and a quorum outcome is logged.
//! 4. **Stabilization**: When this node's two ring successors change, the
//!    `Stabilizer` re-submits every local entry as a CREATE so the new
//!    successors receive copies.
//!
//! ## Submodules
//! - **`types`**: Transaction ids, transaction bookkeeping and quorum verdicts.
//! - **`tracker`**: Owner of all in-flight transactions.
//! - **`protocol`**: The wire message exchanged between nodes.
//! - **`coordinator`**: Client-side fan-out, server-side apply, quorum evaluation.
//! - **`stabilizer`**: Successor tracking and re-replication.

pub mod coordinator;
pub mod protocol;
pub mod stabilizer;
pub mod tracker;
pub mod types;

pub use coordinator::Coordinator;
pub use protocol::{Message, MessageBody};
pub use stabilizer::Stabilizer;
pub use tracker::TransactionTracker;
pub use types::{QUORUM, Transaction, TxnId, Verdict};

#[cfg(test)]
mod tests;
