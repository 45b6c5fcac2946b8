//! Storage Node Module
//!
//! One replicated key/value node: the owner of the ring, the local store and
//! the coordinator, and the dispatch loop that drives them.
//!
//! ## Execution Model
//! A node is single-threaded and cooperative. An external scheduler calls
//! `tick()` (or `receive`, `process` and `stabilize` separately) once per
//! round; none of these calls block.
//! 1. **receive**: Moves everything the transport has for this node onto the
//!    inbound FIFO queue.
//! 2. **process**: Drains the queue in arrival order, serving requests and
//!    counting replies, then forces a verdict on overdue transactions.
//! 3. **stabilize**: Rebuilds the ring from the membership snapshot and lets
//!    the stabilizer re-replicate if this node's successors changed.

#[allow(clippy::module_inception)]
pub mod node;
pub mod types;

pub use node::Node;
pub use types::{DispatchReport, NodeStatus};
