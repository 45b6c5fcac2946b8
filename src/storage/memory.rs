use super::outcome::OutcomeSink;
use super::types::{OpKind, Outcome, OutcomeScope};
use crate::error::{KvError, Result};
use crate::replication::types::TxnId;
use crate::ring::types::Address;

use std::collections::HashMap;
use std::sync::Arc;

/// The key/value table hosted by one node.
///
/// Every operation reports a replica-scoped outcome to the sink, tagged with
/// the transaction id of the request that caused it.
pub struct LocalStore {
    owner: Address,
    entries: HashMap<String, String>,
    sink: Arc<dyn OutcomeSink>,
}

impl LocalStore {
    pub fn new(owner: Address, sink: Arc<dyn OutcomeSink>) -> Self {
        Self {
            owner,
            entries: HashMap::new(),
            sink,
        }
    }

    /// Inserts a new key. Fails if the key is already present.
    pub fn create(&mut self, txn: TxnId, key: &str, value: &str) -> Result<()> {
        let result = if self.entries.contains_key(key) {
            Err(KvError::KeyAlreadyExists(key.to_string()))
        } else {
            self.entries.insert(key.to_string(), value.to_string());
            Ok(())
        };

        self.record(txn, OpKind::Create, key, Some(value), result.is_ok());
        result
    }

    pub fn read(&self, txn: TxnId, key: &str) -> Result<String> {
        let result = self
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| KvError::KeyNotFound(key.to_string()));

        self.record(txn, OpKind::Read, key, result.as_deref().ok(), result.is_ok());
        result
    }

    /// Overwrites an existing key. Fails if the key is absent.
    pub fn update(&mut self, txn: TxnId, key: &str, value: &str) -> Result<()> {
        let result = match self.entries.get_mut(key) {
            Some(current) => {
                *current = value.to_string();
                Ok(())
            }
            None => Err(KvError::KeyNotFound(key.to_string())),
        };

        self.record(txn, OpKind::Update, key, Some(value), result.is_ok());
        result
    }

    pub fn delete(&mut self, txn: TxnId, key: &str) -> Result<()> {
        let result = match self.entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(KvError::KeyNotFound(key.to_string())),
        };

        self.record(txn, OpKind::Delete, key, None, result.is_ok());
        result
    }

    /// Looks a key up without logging, for status reporting and tests.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Copies every entry out, ordered by key.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    fn record(&self, txn: TxnId, op: OpKind, key: &str, value: Option<&str>, success: bool) {
        if !success {
            tracing::debug!("{} {} failed locally on {} (txn {})", op, key, self.owner, txn);
        }

        self.sink.record(Outcome {
            node: self.owner.clone(),
            scope: OutcomeScope::Replica,
            txn,
            op,
            key: key.to_string(),
            value: value.map(str::to_string),
            success,
        });
    }
}
