//! Consistent-Hashing Ring
//!
//! Places member addresses on a fixed numeric ring and answers "which three
//! nodes hold key K".
//!
//! ## Core Concepts
//! - **Positioning**: Addresses and keys are hashed onto `0..RING_SIZE`.
//! - **Snapshots**: The ring is rebuilt wholesale from each membership snapshot;
//!   it is never mutated entry by entry.
//! - **Placement**: A key's primary is the first member at or after its
//!   position. The next two members clockwise are its secondary and tertiary.

pub mod hashring;
pub mod types;

pub use hashring::{HashRing, position_of};
pub use types::{Address, REPLICATION_FACTOR, RING_SIZE, ReplicaRole, ReplicaSet, RingEntry};
