//! Optimistic-concurrency behavior: conflicting submissions against the
//! same records, and replay determinism

use vellum_core::LedgerError;
use vellum_ledger::tx::RevokeCertificateArgs;
use vellum_ledger::{Transaction, TxContext};
use vellum_state::StateError;

mod common;
use common::*;

fn revoke_tx() -> Transaction {
    Transaction::RevokeCertificate(RevokeCertificateArgs {
        certificate_id: "CERT-001".into(),
        reason: None,
    })
}

#[test]
fn conflicting_revocations_cannot_both_commit() {
    let mut ledger = TestLedger::new();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::IssueCertificate(issue_args("CERT-001", STUDENT)),
        )
        .unwrap();

    // Two clients propose a revocation off the same snapshot; both pass
    // validation because both see an Active certificate
    let (first, second) = {
        let snapshot = ledger.state.snapshot();
        let ctx_a = TxContext::new("tx-a", did(UNIVERSITY), t0());
        let ctx_b = TxContext::new("tx-b", did(UNIVERSITY), t0());
        (
            revoke_tx().execute(&snapshot, &ctx_a).unwrap(),
            revoke_tx().execute(&snapshot, &ctx_b).unwrap(),
        )
    };

    // First to commit wins
    ledger.state.commit(first.writes, "tx-a", t0()).unwrap();

    // The second is aborted by its stale read; no lost update
    let err = ledger.state.commit(second.writes, "tx-b", t0()).unwrap_err();
    assert!(matches!(err, StateError::Conflict { .. }));
}

#[test]
fn retry_with_fresh_snapshot_observes_already_revoked() {
    let mut ledger = TestLedger::new();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::IssueCertificate(issue_args("CERT-001", STUDENT)),
        )
        .unwrap();
    ledger.submit(UNIVERSITY, revoke_tx()).unwrap();

    // The aborted client retries against current state and now gets the
    // domain error instead of a conflict
    let err = ledger.submit(UNIVERSITY, revoke_tx()).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyRevoked(_)));
}

#[test]
fn concurrent_issuance_under_the_same_id_cannot_both_commit() {
    let mut ledger = TestLedger::new();

    let (first, second) = {
        let snapshot = ledger.state.snapshot();
        let ctx_a = TxContext::new("tx-a", did(UNIVERSITY), t0());
        let ctx_b = TxContext::new("tx-b", did(UNIVERSITY), t0());
        (
            Transaction::IssueCertificate(issue_args("CERT-001", STUDENT))
                .execute(&snapshot, &ctx_a)
                .unwrap(),
            Transaction::IssueCertificate(issue_args("CERT-001", OTHER_STUDENT))
                .execute(&snapshot, &ctx_b)
                .unwrap(),
        )
    };

    ledger.state.commit(first.writes, "tx-a", t0()).unwrap();
    let err = ledger.state.commit(second.writes, "tx-b", t0()).unwrap_err();
    assert!(matches!(err, StateError::Conflict { .. }));

    // The winner's record is intact
    let result = ledger
        .submit(
            VERIFIER,
            Transaction::ReadCertificate(vellum_ledger::tx::ReadCertificateArgs {
                certificate_id: "CERT-001".into(),
            }),
        )
        .unwrap();
    assert_eq!(result["studentDid"], STUDENT);
}

#[test]
fn replaying_a_transaction_yields_an_identical_receipt() {
    let mut ledger = TestLedger::new();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::IssueCertificate(issue_args("CERT-001", STUDENT)),
        )
        .unwrap();

    let snapshot = ledger.state.snapshot();
    let ctx = TxContext::new("tx-replayed", did(UNIVERSITY), t0());
    let tx = revoke_tx();

    let once = tx.clone().execute(&snapshot, &ctx).unwrap();
    let twice = tx.execute(&snapshot, &ctx).unwrap();

    // Same arguments, same snapshot, same context: bit-identical outcome
    assert_eq!(once, twice);
}

#[test]
fn grant_conflicts_with_concurrent_certificate_write() {
    let mut ledger = TestLedger::new();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::IssueCertificate(issue_args("CERT-001", STUDENT)),
        )
        .unwrap();

    // A grant proposed against the pre-revocation certificate...
    let grant = {
        let snapshot = ledger.state.snapshot();
        let ctx = TxContext::new("tx-grant", did(STUDENT), t0());
        Transaction::GrantConsent(vellum_ledger::GrantConsentArgs {
            id: "CONS-001".into(),
            student_did: did(STUDENT),
            verifier_did: did(VERIFIER),
            certificate_id: "CERT-001".into(),
            purpose: "employment".into(),
            data_shared: vec!["gpa".into()],
            validity_days: 30,
        })
        .execute(&snapshot, &ctx)
        .unwrap()
    };

    // ...loses to a revocation that commits first
    ledger.submit(UNIVERSITY, revoke_tx()).unwrap();
    let err = ledger
        .state
        .commit(grant.writes, "tx-grant", t0())
        .unwrap_err();
    assert!(matches!(err, StateError::Conflict { .. }));
}
