//! Test utilities for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use vellum_core::{Did, LedgerError};
use vellum_ledger::{IssueCertificateArgs, Transaction, TxContext};
use vellum_state::{InMemoryWorldState, LedgerEvent};

pub const UNIVERSITY: &str = "did:web:university.example";
pub const STUDENT: &str = "did:web:student:S1";
pub const OTHER_STUDENT: &str = "did:web:student:S2";
pub const VERIFIER: &str = "did:web:verifier:V1";
pub const OTHER_VERIFIER: &str = "did:web:verifier:V2";

pub fn did(s: &str) -> Did {
    Did::new(s)
}

/// A fixed epoch for tests; all timestamps are offsets from here
pub fn t0() -> DateTime<Utc> {
    "2024-07-01T00:00:00Z".parse().unwrap()
}

/// In-memory ledger node: snapshots, executes, and commits transactions,
/// assigning sequential tx ids the way the ordering service would
pub struct TestLedger {
    pub state: InMemoryWorldState,
    pub events: Vec<LedgerEvent>,
    next_tx: u64,
}

impl TestLedger {
    pub fn new() -> Self {
        Self {
            state: InMemoryWorldState::new(),
            events: Vec::new(),
            next_tx: 0,
        }
    }

    pub fn next_tx_id(&mut self) -> String {
        self.next_tx += 1;
        format!("tx-{}", self.next_tx)
    }

    /// Execute a transaction against a fresh snapshot and commit its writes
    pub fn submit_at(
        &mut self,
        caller: &str,
        at: DateTime<Utc>,
        tx: Transaction,
    ) -> Result<serde_json::Value, LedgerError> {
        let tx_id = self.next_tx_id();
        let ctx = TxContext::new(tx_id, did(caller), at);
        let receipt = {
            let snapshot = self.state.snapshot();
            tx.execute(&snapshot, &ctx)?
        };
        let events = self
            .state
            .commit(receipt.writes, &ctx.tx_id, ctx.timestamp)
            .expect("read-set is current, commit cannot conflict");
        self.events.extend(events);
        Ok(receipt.result)
    }

    pub fn submit(&mut self, caller: &str, tx: Transaction) -> Result<serde_json::Value, LedgerError> {
        self.submit_at(caller, t0(), tx)
    }
}

/// Issue args for a typical certificate, with the open metadata fields the
/// disclosure tests exercise
pub fn issue_args(id: &str, student: &str) -> IssueCertificateArgs {
    IssueCertificateArgs {
        id: id.into(),
        student_did: did(student),
        student_name: "Ada Lovelace".into(),
        issuer_did: did(UNIVERSITY),
        institution_name: "University of Example".into(),
        degree: "BSc Computer Science".into(),
        major: "Computer Science".into(),
        gpa: "3.9".into(),
        graduation_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        certificate_hash: "ab".repeat(32),
        ipfs_reference: None,
        metadata: [
            ("course".to_string(), "CS".to_string()),
            ("grade".to_string(), "A+".to_string()),
        ]
        .into(),
    }
}
