//! Simulation Module
//!
//! Runs a whole cluster inside one process, round by round, over an
//! `InMemoryNetwork`.
//!
//! ## Round Structure
//! Every round advances the shared `RoundClock` once and then ticks each live
//! node in index order. A message sent during a round is seen by nodes that
//! tick later in the same round, or by everyone in the next one.
//!
//! ## Failures
//! Crashing a node (`fail_node`) and the failure detector noticing it
//! (`remove_member`) are separate steps. Between the two, the rest of the
//! cluster keeps routing requests to the dead node and relies on quorum and
//! timeouts.

pub mod cluster;

pub use cluster::Cluster;
