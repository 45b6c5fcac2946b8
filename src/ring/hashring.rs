use super::types::*;

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Maps a node address or a key onto the ring.
///
/// `DefaultHasher::new()` uses fixed keys, so every node built from the same
/// binary agrees on positions.
pub fn position_of(identifier: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    identifier.hash(&mut hasher);
    hasher.finish() % RING_SIZE
}

/// Live members sorted by ring position.
#[derive(Debug, Clone, Default)]
pub struct HashRing {
    entries: Vec<RingEntry>,
}

impl HashRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ring from explicit positions instead of hashing the addresses.
    pub fn from_positions<I>(members: I) -> Self
    where
        I: IntoIterator<Item = (Address, u64)>,
    {
        let mut ring = Self::new();
        ring.replace(
            members
                .into_iter()
                .map(|(address, position)| RingEntry {
                    address,
                    position: position % RING_SIZE,
                })
                .collect(),
        );
        ring
    }

    /// Replaces the ring contents with a fresh membership snapshot.
    ///
    /// Duplicate addresses collapse to one entry. Returns `true` when the
    /// ordered membership differs from the previous snapshot.
    pub fn refresh<I>(&mut self, live_members: I) -> bool
    where
        I: IntoIterator<Item = Address>,
    {
        let entries = live_members
            .into_iter()
            .map(|address| RingEntry {
                position: position_of(address.as_str()),
                address,
            })
            .collect();
        self.replace(entries)
    }

    fn replace(&mut self, mut entries: Vec<RingEntry>) -> bool {
        let mut seen = HashSet::new();
        entries.retain(|entry| seen.insert(entry.address.clone()));

        // Ties on position fall back to the address so every node derives
        // the same order from an unordered snapshot.
        entries.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.address.cmp(&b.address))
        });

        let changed = entries != self.entries;
        self.entries = entries;
        changed
    }

    pub fn entries(&self) -> &[RingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.address == address)
    }

    /// Returns the replica triple for `key`, or `None` while the ring is
    /// smaller than the replication factor.
    ///
    /// Positions at or below the first member, and positions past the last
    /// member, both wrap to the first three entries.
    pub fn find_replicas(&self, key: &str) -> Option<ReplicaSet> {
        self.replicas_at(position_of(key))
    }

    pub fn replicas_at(&self, position: u64) -> Option<ReplicaSet> {
        let n = self.entries.len();
        if n < REPLICATION_FACTOR {
            return None;
        }

        let first = self.entries[0].position;
        let last = self.entries[n - 1].position;

        let primary_idx = if position <= first || position > last {
            0
        } else {
            // first < position <= last, so some entry past index 0 matches
            self.entries
                .iter()
                .skip(1)
                .position(|entry| position <= entry.position)
                .map(|offset| offset + 1)?
        };

        Some(ReplicaSet {
            primary: self.entries[primary_idx].clone(),
            secondary: self.entries[(primary_idx + 1) % n].clone(),
            tertiary: self.entries[(primary_idx + 2) % n].clone(),
        })
    }

    /// The two members that follow `address` clockwise.
    pub fn successors_of(&self, address: &Address) -> Option<[Address; 2]> {
        let n = self.entries.len();
        let i = self.index_of(address)?;
        Some([
            self.entries[(i + 1) % n].address.clone(),
            self.entries[(i + 2) % n].address.clone(),
        ])
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.entries
            .iter()
            .map(|entry| entry.address.clone())
            .collect()
    }
}
