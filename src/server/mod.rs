//! Server Module
//!
//! Hosts one node inside a tokio process and exposes it over HTTP.
//!
//! ## Architecture Overview
//! 1. **Runtime**: A single task owns the `Node`. It ticks the node on a fixed
//!    interval and, between ticks, executes commands sent over an mpsc channel.
//!    Nothing else touches the node, so the single-owner execution model holds.
//! 2. **Handle**: `NodeHandle` is the cloneable front door. It forwards client
//!    requests to the runtime and waits on a oneshot for the answer. Outcome
//!    lookups go straight to the shared `OutcomeJournal`.
//! 3. **HTTP**: axum handlers translate JSON requests into handle calls.
//!    Writes return `202 Accepted` with the transaction id; the verdict is
//!    polled through `/txn/:id`.

pub mod handlers;
pub mod protocol;
pub mod runtime;

pub use handlers::router;
pub use runtime::{NodeHandle, NodeRuntime};
