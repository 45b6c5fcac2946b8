//! Membership View Module
//!
//! The replication layer does not detect failures itself. It consumes a
//! snapshot of live member addresses from whatever failure detector the
//! deployment runs, and rebuilds its ring from that snapshot.
//!
//! ## Implementations
//! - **`StaticMembership`**: A fixed list, for clusters whose membership never changes.
//! - **`SharedMembership`**: A replaceable snapshot that an external detector
//!   (or a test, or the `/members` HTTP endpoint) pushes updates into.

pub mod view;

pub use view::{MembershipView, SharedMembership, StaticMembership};
