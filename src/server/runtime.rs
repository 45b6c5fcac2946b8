use super::protocol::{TxnResponse, TxnState};
use crate::clock::RoundClock;
use crate::error::{KvError, Result};
use crate::membership::SharedMembership;
use crate::node::{Node, NodeStatus};
use crate::replication::types::TxnId;
use crate::ring::Address;
use crate::storage::{OpKind, OutcomeJournal};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 1024;

enum Command {
    Submit {
        op: OpKind,
        key: String,
        value: Option<String>,
        reply: oneshot::Sender<Result<TxnId>>,
    },
    IsPending {
        txn: TxnId,
        reply: oneshot::Sender<bool>,
    },
    Status {
        reply: oneshot::Sender<NodeStatus>,
    },
}

/// Owns a `Node` and drives it from one tokio task.
pub struct NodeRuntime {
    node: Node,
    clock: Arc<RoundClock>,
    commands: mpsc::Receiver<Command>,
    round_interval: Duration,
}

impl NodeRuntime {
    /// Wraps `node` and returns the runtime together with a handle to it.
    ///
    /// `clock` must be the clock the node was built with; the runtime advances
    /// it once per round.
    pub fn new(
        node: Node,
        clock: Arc<RoundClock>,
        membership: Arc<SharedMembership>,
        journal: Arc<OutcomeJournal>,
        round_interval: Duration,
    ) -> (Self, NodeHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);

        let handle = NodeHandle {
            address: node.address().clone(),
            commands: tx,
            membership,
            journal,
        };

        let runtime = Self {
            node,
            clock,
            commands: rx,
            round_interval,
        };

        (runtime, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Ticks the node every round and serves commands in between. Returns
    /// once every handle has been dropped.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.round_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        self.node.stabilize();
        tracing::info!(
            "Node {} running, round interval {:?}",
            self.node.address(),
            self.round_interval
        );

        loop {
            let command = tokio::select! {
                _ = interval.tick() => None,
                command = self.commands.recv() => match command {
                    Some(command) => Some(command),
                    None => break,
                },
            };

            match command {
                Some(command) => self.execute(command),
                None => self.round(),
            }
        }

        tracing::info!("Node {} runtime stopped", self.node.address());
    }

    fn round(&mut self) {
        let round = self.clock.advance();
        let report = self.node.tick();
        if report.committed + report.failed > 0 {
            tracing::debug!("Round {}: {:?}", round, report);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Submit {
                op,
                key,
                value,
                reply,
            } => {
                let result = self.node.submit(op, &key, value.as_deref());
                let _ = reply.send(result);
            }
            Command::IsPending { txn, reply } => {
                let _ = reply.send(self.node.is_pending(txn));
            }
            Command::Status { reply } => {
                let _ = reply.send(self.node.status());
            }
        }
    }
}

/// Cloneable access to a running node.
#[derive(Clone)]
pub struct NodeHandle {
    address: Address,
    commands: mpsc::Sender<Command>,
    membership: Arc<SharedMembership>,
    journal: Arc<OutcomeJournal>,
}

impl NodeHandle {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub async fn submit(&self, op: OpKind, key: String, value: Option<String>) -> Result<TxnId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit {
            op,
            key,
            value,
            reply,
        })
        .await?;
        rx.await.map_err(|_| stopped())?
    }

    pub async fn status(&self) -> Result<NodeStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Where transaction `txn` issued by this node stands.
    pub async fn transaction(&self, txn: TxnId) -> Result<TxnResponse> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::IsPending { txn, reply }).await?;

        // Ask the runtime first: a transaction that finishes after this
        // answer is already in the journal when we look.
        if rx.await.map_err(|_| stopped())? {
            return Ok(TxnResponse {
                txn,
                state: TxnState::Pending,
                value: None,
            });
        }

        let response = match self.journal.quorum_outcome(&self.address, txn) {
            Some(outcome) if outcome.success => TxnResponse {
                txn,
                state: TxnState::Committed,
                value: outcome.value,
            },
            Some(_) => TxnResponse {
                txn,
                state: TxnState::Failed,
                value: None,
            },
            None => TxnResponse {
                txn,
                state: TxnState::Unknown,
                value: None,
            },
        };
        Ok(response)
    }

    /// Replaces the live-member snapshot the node rebuilds its ring from.
    pub fn set_members(&self, members: Vec<Address>) -> usize {
        let count = members.len();
        self.membership.set(members);
        count
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| stopped())
    }
}

fn stopped() -> KvError {
    KvError::Transport("node runtime has stopped".to_string())
}
