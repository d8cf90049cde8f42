//! In-memory world state
//!
//! A versioned key-value store with optimistic-concurrency commit, used by
//! tests and by embedders that want a self-contained node. Every committed
//! version of every key is retained, which is what backs the audit-trail
//! history queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::store::{
    HistoryEntry, LedgerEvent, StateError, StateView, Version, VersionedValue, WriteSet,
};

#[derive(Debug, Clone)]
struct CommittedVersion {
    version: Version,
    tx_id: String,
    timestamp: DateTime<Utc>,
    value: serde_json::Value,
}

/// In-memory versioned world state
///
/// Keys map to their full commit history, newest last. `BTreeMap` keeps
/// prefix scans ordered, which the ledger's index keys rely on.
#[derive(Debug, Default)]
pub struct InMemoryWorldState {
    entries: BTreeMap<String, Vec<CommittedVersion>>,
    height: Version,
}

impl InMemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence number of the last committed transaction
    pub fn height(&self) -> Version {
        self.height
    }

    /// A read view pinned at the current commit height
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: self,
            height: self.height,
        }
    }

    /// Atomically apply a write-set
    ///
    /// Every version recorded in the write-set's read-set is validated
    /// against the current head first; any mismatch aborts the whole commit
    /// with [`StateError::Conflict`] and no key is touched. On success the
    /// committed events are returned for the runtime to publish.
    pub fn commit(
        &mut self,
        writes: WriteSet,
        tx_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<LedgerEvent>, StateError> {
        for (key, read) in writes.reads() {
            let head = self.head_version(key);
            if head != *read {
                tracing::warn!(%tx_id, %key, ?read, ?head, "stale read, aborting commit");
                return Err(StateError::Conflict {
                    key: key.clone(),
                    read: *read,
                    head,
                });
            }
        }

        self.height += 1;
        let version = self.height;
        for (key, value) in writes.puts() {
            self.entries
                .entry(key.clone())
                .or_default()
                .push(CommittedVersion {
                    version,
                    tx_id: tx_id.to_string(),
                    timestamp,
                    value: value.clone(),
                });
        }

        tracing::debug!(
            %tx_id,
            version,
            puts = writes.puts().len(),
            events = writes.events().len(),
            "committed"
        );
        Ok(writes.events().to_vec())
    }

    fn head_version(&self, key: &str) -> Option<Version> {
        self.entries
            .get(key)
            .and_then(|versions| versions.last())
            .map(|committed| committed.version)
    }
}

/// Read view over an [`InMemoryWorldState`], pinned at a commit height
///
/// Commits that land after the snapshot was taken are invisible to it, so
/// an operation always computes against the state it was given.
pub struct Snapshot<'a> {
    state: &'a InMemoryWorldState,
    height: Version,
}

impl Snapshot<'_> {
    fn visible<'v>(&self, versions: &'v [CommittedVersion]) -> Option<&'v CommittedVersion> {
        versions.iter().rev().find(|c| c.version <= self.height)
    }
}

impl StateView for Snapshot<'_> {
    fn get(&self, key: &str) -> Option<VersionedValue> {
        let versions = self.state.entries.get(key)?;
        self.visible(versions).map(|committed| VersionedValue {
            value: committed.value.clone(),
            version: committed.version,
        })
    }

    fn scan_prefix<'b>(
        &'b self,
        prefix: &str,
    ) -> Box<dyn Iterator<Item = (String, VersionedValue)> + 'b> {
        let range = self
            .state
            .entries
            .range(prefix.to_string()..)
            .take_while({
                let prefix = prefix.to_string();
                move |(key, _)| key.starts_with(&prefix)
            });
        Box::new(range.filter_map(|(key, versions)| {
            self.visible(versions).map(|committed| {
                (
                    key.clone(),
                    VersionedValue {
                        value: committed.value.clone(),
                        version: committed.version,
                    },
                )
            })
        }))
    }

    fn history(&self, key: &str) -> Vec<HistoryEntry> {
        let Some(versions) = self.state.entries.get(key) else {
            return Vec::new();
        };
        versions
            .iter()
            .filter(|c| c.version <= self.height)
            .map(|c| HistoryEntry {
                tx_id: c.tx_id.clone(),
                timestamp: c.timestamp,
                value: c.value.clone(),
            })
            .collect()
    }
}
