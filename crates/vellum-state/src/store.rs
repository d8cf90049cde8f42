//! World-state read views and write-sets
//!
//! Ledger operations are pure functions from a snapshot of the world state
//! to a result plus a [`WriteSet`]. The runtime commits the write-set
//! atomically, but only if every version the operation read is still
//! current. That check is the whole of the optimistic-concurrency contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monotonic commit sequence number assigned by the store
pub type Version = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A recorded read is stale: another transaction committed to the key
    /// between snapshot and commit. The runtime retries with a fresh
    /// snapshot; nothing was applied.
    #[error("write conflict on {key}: read version {read:?}, head is {head:?}")]
    Conflict {
        key: String,
        read: Option<Version>,
        head: Option<Version>,
    },
}

/// A stored value together with the version that committed it
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedValue {
    pub value: serde_json::Value,
    pub version: Version,
}

/// One committed state of a key, as returned by audit-trail queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Identifier of the committing transaction
    pub tx_id: String,

    /// Commit timestamp (the transaction's, not wall clock at read time)
    pub timestamp: DateTime<Utc>,

    pub value: serde_json::Value,
}

/// Event emitted by a committed transaction, for external subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

/// Snapshot-read access to the world state
///
/// Implementations must be stable for the lifetime of the view: repeated
/// reads of the same key return the same version, regardless of commits
/// happening elsewhere.
pub trait StateView {
    /// Read the current value of a key, if present
    fn get(&self, key: &str) -> Option<VersionedValue>;

    /// Ordered, lazy scan over every live key starting with `prefix`
    fn scan_prefix<'a>(
        &'a self,
        prefix: &str,
    ) -> Box<dyn Iterator<Item = (String, VersionedValue)> + 'a>;

    /// Every committed version of a key, oldest first
    fn history(&self, key: &str) -> Vec<HistoryEntry>;
}

/// The buffered effects of one ledger operation
///
/// Contains only data derived from the operation's arguments and snapshot:
/// no wall-clock reads, no randomness, so replaying the transaction on any
/// node produces a bit-identical write-set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSet {
    puts: Vec<(String, serde_json::Value)>,
    reads: Vec<(String, Option<Version>)>,
    events: Vec<LedgerEvent>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a put. Applied in insertion order at commit.
    pub fn put(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.puts.push((key.into(), value));
    }

    /// Record the version this operation observed for `key` (`None` when
    /// the key was absent). Commit fails if the head has moved since.
    pub fn record_read(&mut self, key: impl Into<String>, version: Option<Version>) {
        self.reads.push((key.into(), version));
    }

    /// Emit an event to be published if and when the write-set commits
    pub fn emit(&mut self, name: impl Into<String>, payload: serde_json::Value) {
        self.events.push(LedgerEvent {
            name: name.into(),
            payload,
        });
    }

    pub fn puts(&self) -> &[(String, serde_json::Value)] {
        &self.puts
    }

    pub fn reads(&self) -> &[(String, Option<Version>)] {
        &self.reads
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.events.is_empty()
    }
}
