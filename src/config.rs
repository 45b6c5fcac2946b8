//! Node configuration.
//!
//! Resolved in three layers: built-in defaults, then `RING_KV_*` environment
//! variables, then command-line flags.

use crate::ring::Address;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

const HTTP_PORT_OFFSET: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// UDP address replication traffic is bound to. Also this node's ring identity.
    pub bind: SocketAddr,
    /// HTTP client API address. Defaults to the bind port plus 1000.
    pub http_addr: Option<SocketAddr>,
    /// Initial live members. `bind` is added if missing.
    pub peers: Vec<String>,
    pub round_interval_ms: u64,
    /// Rounds before an unanswered transaction is forced to a verdict.
    pub transaction_timeout: u64,
    /// Outcomes kept in memory for `/txn` lookups.
    pub journal_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            http_addr: None,
            peers: vec![],
            round_interval_ms: 100,
            transaction_timeout: 3,
            journal_capacity: 10_000,
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Applies `RING_KV_*` overrides obtained through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("RING_KV_BIND") {
            self.bind = bind.parse().context("RING_KV_BIND")?;
        }
        if let Some(http) = lookup("RING_KV_HTTP") {
            self.http_addr = Some(http.parse().context("RING_KV_HTTP")?);
        }
        if let Some(peers) = lookup("RING_KV_PEERS") {
            self.peers = peers
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(ms) = lookup("RING_KV_ROUND_MS") {
            self.round_interval_ms = ms.parse().context("RING_KV_ROUND_MS")?;
        }
        if let Some(rounds) = lookup("RING_KV_TIMEOUT_ROUNDS") {
            self.transaction_timeout = rounds.parse().context("RING_KV_TIMEOUT_ROUNDS")?;
        }
        if let Some(capacity) = lookup("RING_KV_JOURNAL_CAPACITY") {
            self.journal_capacity = capacity.parse().context("RING_KV_JOURNAL_CAPACITY")?;
        }

        Ok(self)
    }

    /// Applies `--flag value` arguments. `args` excludes the program name.
    pub fn with_args(mut self, args: &[String]) -> anyhow::Result<Self> {
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args
                .get(i + 1)
                .with_context(|| format!("{} requires a value", flag));

            match flag {
                "--bind" => self.bind = value?.parse().context("--bind")?,
                "--http" => self.http_addr = Some(value?.parse().context("--http")?),
                "--peer" => self.peers.push(value?.clone()),
                "--round-ms" => self.round_interval_ms = value?.parse().context("--round-ms")?,
                "--timeout-rounds" => {
                    self.transaction_timeout = value?.parse().context("--timeout-rounds")?
                }
                other => {
                    tracing::warn!("Ignoring unknown argument {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.round_interval_ms == 0 {
            bail!("round interval must be at least 1 ms");
        }
        if self.transaction_timeout == 0 {
            bail!("transaction timeout must be at least 1 round");
        }
        Ok(())
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr.unwrap_or_else(|| {
            let mut addr = self.bind;
            addr.set_port(self.bind.port().saturating_add(HTTP_PORT_OFFSET));
            addr
        })
    }

    pub fn local_address(&self) -> Address {
        Address::new(self.bind.to_string())
    }

    /// Initial membership snapshot, always containing this node.
    pub fn members(&self) -> Vec<Address> {
        let local = self.local_address();
        let mut members: Vec<Address> = self.peers.iter().map(Address::new).collect();
        if !members.contains(&local) {
            members.push(local);
        }
        members
    }
}
