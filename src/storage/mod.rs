//! Local Storage Module
//!
//! The per-node key/value table that replicas apply CRUD requests to, plus the
//! outcome log that makes every storage decision observable.
//!
//! ## Core Concepts
//! - **Exact match only**: `LocalStore` is a plain string-to-string table with
//!   create/read/update/delete; there are no range or prefix queries.
//! - **No silent overwrite**: CREATE on an existing key and UPDATE/DELETE/READ on
//!   a missing key are failures, not upserts.
//! - **Outcomes**: Each local operation, and each quorum decision taken by the
//!   replication layer, is reported to an `OutcomeSink`. Replica-scoped and
//!   quorum-scoped outcomes are tagged apart.

pub mod memory;
pub mod outcome;
pub mod types;

pub use memory::LocalStore;
pub use outcome::{FanoutSink, OutcomeJournal, OutcomeSink, QuorumOnly, TracingSink};
pub use types::{OpKind, Outcome, OutcomeScope};
