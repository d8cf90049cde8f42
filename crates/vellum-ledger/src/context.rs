//! Per-transaction execution context
//!
//! Everything an operation may know about "now" and "who": the committing
//! transaction's identifier, the authenticated caller, and the transaction
//! timestamp. All three are supplied by the runtime, never generated here,
//! so re-executing the same transaction on any node is bit-identical.

use chrono::{DateTime, Utc};
use vellum_core::Did;

/// The identity and clock of one transaction
#[derive(Debug, Clone)]
pub struct TxContext {
    /// Identifier assigned by the ordering service
    pub tx_id: String,

    /// The caller's DID, authenticated upstream
    pub caller: Did,

    /// The transaction's timestamp; the only notion of "now" inside the core
    pub timestamp: DateTime<Utc>,
}

impl TxContext {
    pub fn new(tx_id: impl Into<String>, caller: Did, timestamp: DateTime<Utc>) -> Self {
        Self {
            tx_id: tx_id.into(),
            caller,
            timestamp,
        }
    }
}
