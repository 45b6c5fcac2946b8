use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of positions on the ring. Every hash is reduced modulo this value.
pub const RING_SIZE: u64 = 512;

/// Copies kept of every key: one primary plus two successors.
pub const REPLICATION_FACTOR: usize = 3;

/// Opaque node identifier as handed out by the membership layer.
///
/// For the UDP transport this is a `host:port` string; the ring only ever
/// hashes and compares it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

/// A member placed on the ring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RingEntry {
    pub address: Address,
    pub position: u64,
}

/// Which copy of a key a replica holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplicaRole {
    Primary,
    Secondary,
    Tertiary,
}

/// The three ring entries responsible for one key, in placement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSet {
    pub primary: RingEntry,
    pub secondary: RingEntry,
    pub tertiary: RingEntry,
}

impl ReplicaSet {
    /// Yields `(role, entry)` pairs from primary to tertiary.
    pub fn iter(&self) -> impl Iterator<Item = (ReplicaRole, &RingEntry)> {
        [
            (ReplicaRole::Primary, &self.primary),
            (ReplicaRole::Secondary, &self.secondary),
            (ReplicaRole::Tertiary, &self.tertiary),
        ]
        .into_iter()
    }

    pub fn addresses(&self) -> [&Address; REPLICATION_FACTOR] {
        [
            &self.primary.address,
            &self.secondary.address,
            &self.tertiary.address,
        ]
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses().contains(&address)
    }
}
