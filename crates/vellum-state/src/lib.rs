//! Vellum State
//!
//! The world-state store abstraction the ledger components execute over:
//! snapshot reads, buffered write-sets with recorded read versions, and an
//! in-memory implementation with optimistic-concurrency commit.
//!
//! The consensus/ordering service that totally orders transactions lives
//! outside this crate; here a "transaction" is just a write-set plus the
//! identifiers the runtime hands in.

pub mod memory;
pub mod store;

pub use memory::{InMemoryWorldState, Snapshot};
pub use store::{
    HistoryEntry, LedgerEvent, StateError, StateView, Version, VersionedValue, WriteSet,
};
