//! Transport Module
//!
//! The send/receive primitive replication messages travel over.
//!
//! ## Contract
//! - **send** is fire-and-forget: no delivery guarantee and no acknowledgement.
//!   An `Err` only means the message could not even be handed off.
//! - **receive** never blocks. It returns whatever has arrived for the given
//!   address, possibly nothing.
//!
//! ## Implementations
//! - **`InMemoryNetwork`**: An emulated network shared by many nodes in one
//!   process, with failure injection and random loss. Drives tests and the
//!   simulation cluster.
//! - **`UdpTransport`**: One datagram per message over a tokio `UdpSocket`.

pub mod memory;
pub mod udp;

pub use memory::{InMemoryNetwork, NetworkStats};
pub use udp::UdpTransport;

use crate::error::Result;
use crate::ring::types::Address;

pub trait Transport: Send + Sync {
    fn send(&self, from: &Address, to: &Address, payload: String) -> Result<()>;

    fn receive(&self, local: &Address) -> Vec<Vec<u8>>;
}

#[cfg(test)]
mod tests;
