use crate::ring::types::Address;

use parking_lot::RwLock;
use std::sync::Arc;

/// Source of the current live-member snapshot. Order is not significant.
pub trait MembershipView: Send + Sync {
    fn live_members(&self) -> Vec<Address>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticMembership {
    members: Vec<Address>,
}

impl StaticMembership {
    pub fn new(members: Vec<Address>) -> Arc<Self> {
        Arc::new(Self { members })
    }
}

impl MembershipView for StaticMembership {
    fn live_members(&self) -> Vec<Address> {
        self.members.clone()
    }
}

#[derive(Debug, Default)]
pub struct SharedMembership {
    members: RwLock<Vec<Address>>,
}

impl SharedMembership {
    pub fn new(members: Vec<Address>) -> Arc<Self> {
        Arc::new(Self {
            members: RwLock::new(members),
        })
    }

    /// Replaces the whole snapshot.
    pub fn set(&self, members: Vec<Address>) {
        tracing::info!("Membership snapshot replaced: {} live member(s)", members.len());
        *self.members.write() = members;
    }

    pub fn add(&self, member: Address) {
        let mut members = self.members.write();
        if !members.contains(&member) {
            members.push(member);
        }
    }

    /// Drops a member, as a failure detector would on declaring it dead.
    pub fn remove(&self, member: &Address) -> bool {
        let mut members = self.members.write();
        let before = members.len();
        members.retain(|m| m != member);
        members.len() != before
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl MembershipView for SharedMembership {
    fn live_members(&self) -> Vec<Address> {
        self.members.read().clone()
    }
}
