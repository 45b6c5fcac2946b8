//! Replicated Key-Value Store Library
//!
//! A key-value store whose nodes sit on a consistent-hashing ring. Every key
//! lives on three consecutive ring members and every client operation is
//! decided by a 2-of-3 quorum of their replies.
//!
//! ## Architecture Modules
//! - **`ring`**: Hash positions, the sorted member ring and replica placement.
//! - **`storage`**: The per-node key/value table and the outcome log.
//! - **`replication`**: Transactions, quorum evaluation, the wire protocol and
//!   re-replication when a node's successors change.
//! - **`node`**: One storage node and its receive/process/stabilize loop.
//! - **`transport`**: Fire-and-forget message delivery, in memory or over UDP.
//! - **`membership`**: The live-member snapshot consumed from a failure detector.
//! - **`clock`**: Logical time in scheduler rounds.
//! - **`simulation`**: Whole clusters driven round by round in one process.
//! - **`server`**: A tokio runtime hosting one node behind an HTTP API.
//! - **`config`**: Node settings from defaults, environment and arguments.

pub mod clock;
pub mod config;
pub mod error;
pub mod membership;
pub mod node;
pub mod replication;
pub mod ring;
pub mod server;
pub mod simulation;
pub mod storage;
pub mod transport;
