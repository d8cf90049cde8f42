//! Disclosure protocol: consent-mediated projection and the public
//! tamper-evidence check

use chrono::Duration;
use vellum_core::LedgerError;
use vellum_ledger::tx::{
    IsConsentValidArgs, QuickVerifyArgs, RevokeCertificateArgs, RevokeConsentArgs,
    VerifyDisclosureArgs,
};
use vellum_ledger::{GrantConsentArgs, Transaction};

mod common;
use common::*;

fn verify_args(as_of: chrono::DateTime<chrono::Utc>) -> VerifyDisclosureArgs {
    VerifyDisclosureArgs {
        certificate_id: "CERT-001".into(),
        consent_id: "CONS-001".into(),
        verifier_did: did(VERIFIER),
        as_of: Some(as_of),
    }
}

/// Issue CERT-001 for the student and grant CONS-001 to the verifier with
/// `dataShared = ["grade"]`, 30 days of validity
fn ledger_with_grant() -> TestLedger {
    let mut ledger = TestLedger::new();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::IssueCertificate(issue_args("CERT-001", STUDENT)),
        )
        .unwrap();
    ledger
        .submit(
            STUDENT,
            Transaction::GrantConsent(GrantConsentArgs {
                id: "CONS-001".into(),
                student_did: did(STUDENT),
                verifier_did: did(VERIFIER),
                certificate_id: "CERT-001".into(),
                purpose: "employment".into(),
                data_shared: vec!["grade".into()],
                validity_days: 30,
            }),
        )
        .unwrap();
    ledger
}

#[test]
fn disclosure_projects_only_consented_fields() {
    let mut ledger = ledger_with_grant();
    let result = ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(1))),
        )
        .unwrap();

    // Granted field is present, everything else is not
    assert_eq!(result["fields"]["grade"], "A+");
    assert!(result["fields"].get("course").is_none());
    assert!(result["fields"].get("gpa").is_none());
    assert!(result["fields"].get("studentName").is_none());

    // Provenance is always visible without consent
    assert_eq!(result["certificateId"], "CERT-001");
    assert_eq!(result["status"], "ACTIVE");
    assert_eq!(result["issuerDid"], UNIVERSITY);
    assert_eq!(result["institutionName"], "University of Example");

    // Remaining validity window: 29 of 30 days left
    assert_eq!(
        result["remainingValiditySecs"],
        serde_json::json!(Duration::days(29).num_seconds())
    );
}

#[test]
fn disclosure_after_consent_revocation_fails_consent_invalid() {
    let mut ledger = ledger_with_grant();
    ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(1))),
        )
        .unwrap();

    ledger
        .submit(
            STUDENT,
            Transaction::RevokeConsent(RevokeConsentArgs {
                consent_id: "CONS-001".into(),
                reason: None,
            }),
        )
        .unwrap();

    let err = ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(1))),
        )
        .unwrap_err();
    assert_eq!(err, LedgerError::ConsentInvalid);
}

#[test]
fn consent_failures_are_indistinguishable() {
    let mut ledger = ledger_with_grant();

    // Expired
    let expired = ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(31))),
        )
        .unwrap_err();
    // Wrong verifier
    let mut wrong_verifier = verify_args(t0() + Duration::days(1));
    wrong_verifier.verifier_did = did(OTHER_VERIFIER);
    let mismatched = ledger
        .submit(
            OTHER_VERIFIER,
            Transaction::VerifyDisclosure(wrong_verifier),
        )
        .unwrap_err();
    // Missing consent
    let mut missing = verify_args(t0() + Duration::days(1));
    missing.consent_id = "CONS-404".into();
    let absent = ledger
        .submit(VERIFIER, Transaction::VerifyDisclosure(missing))
        .unwrap_err();

    // All three collapse to the same undifferentiated error
    assert_eq!(expired, LedgerError::ConsentInvalid);
    assert_eq!(mismatched, LedgerError::ConsentInvalid);
    assert_eq!(absent, LedgerError::ConsentInvalid);
}

#[test]
fn certificate_revocation_blocks_disclosure_despite_valid_consent() {
    let mut ledger = ledger_with_grant();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::RevokeCertificate(RevokeCertificateArgs {
                certificate_id: "CERT-001".into(),
                reason: Some("degree rescinded".into()),
            }),
        )
        .unwrap();

    // The consent itself still validates...
    let valid = ledger
        .submit(
            VERIFIER,
            Transaction::IsConsentValid(IsConsentValidArgs {
                consent_id: "CONS-001".into(),
                verifier_did: did(VERIFIER),
                as_of: Some(t0() + Duration::days(1)),
            }),
        )
        .unwrap();
    assert_eq!(valid, serde_json::json!(true));

    // ...but disclosure is blocked unconditionally
    let err = ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(1))),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::CertificateRevoked(_)));
}

#[test]
fn consent_certificate_pairing_is_checked() {
    let mut ledger = ledger_with_grant();
    ledger
        .submit(
            UNIVERSITY,
            Transaction::IssueCertificate(issue_args("CERT-002", STUDENT)),
        )
        .unwrap();

    let mut args = verify_args(t0() + Duration::days(1));
    args.certificate_id = "CERT-002".into();
    let err = ledger
        .submit(VERIFIER, Transaction::VerifyDisclosure(args))
        .unwrap_err();
    assert!(matches!(err, LedgerError::CertificateMismatch { .. }));
}

#[test]
fn quick_verify_checks_hash_and_status_without_consent() {
    let mut ledger = TestLedger::new();
    let document = b"transcript pdf bytes";
    let mut args = issue_args("CERT-001", STUDENT);
    args.certificate_hash = vellum_core::hash::document_hash(document);
    let anchored_hash = args.certificate_hash.clone();
    ledger
        .submit(UNIVERSITY, Transaction::IssueCertificate(args))
        .unwrap();

    // A verifier recomputes the hash from the document they were handed
    let result = ledger
        .submit(
            VERIFIER,
            Transaction::QuickVerify(QuickVerifyArgs {
                certificate_id: "CERT-001".into(),
                expected_hash: vellum_core::hash::document_hash(document),
            }),
        )
        .unwrap();
    assert_eq!(result["hashMatches"], serde_json::json!(true));
    assert_eq!(result["status"], "ACTIVE");

    // A wrong hash is an answer, not an error
    let result = ledger
        .submit(
            VERIFIER,
            Transaction::QuickVerify(QuickVerifyArgs {
                certificate_id: "CERT-001".into(),
                expected_hash: "tampered".into(),
            }),
        )
        .unwrap();
    assert_eq!(result["hashMatches"], serde_json::json!(false));

    // Revocation turns quick verification into a hard failure
    ledger
        .submit(
            UNIVERSITY,
            Transaction::RevokeCertificate(RevokeCertificateArgs {
                certificate_id: "CERT-001".into(),
                reason: None,
            }),
        )
        .unwrap();
    let err = ledger
        .submit(
            VERIFIER,
            Transaction::QuickVerify(QuickVerifyArgs {
                certificate_id: "CERT-001".into(),
                expected_hash: anchored_hash,
            }),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::CertificateRevoked(_)));

    let err = ledger
        .submit(
            VERIFIER,
            Transaction::QuickVerify(QuickVerifyArgs {
                certificate_id: "CERT-404".into(),
                expected_hash: "anything".into(),
            }),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn end_to_end_issue_grant_disclose_revoke() {
    let mut ledger = ledger_with_grant();

    // Disclosure inside the window shows the grade but not the course
    let result = ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(1))),
        )
        .unwrap();
    assert_eq!(result["fields"]["grade"], "A+");
    assert!(result["fields"].get("course").is_none());

    // The student withdraws the consent; the same request now fails
    ledger
        .submit(
            STUDENT,
            Transaction::RevokeConsent(RevokeConsentArgs {
                consent_id: "CONS-001".into(),
                reason: None,
            }),
        )
        .unwrap();
    let err = ledger
        .submit(
            VERIFIER,
            Transaction::VerifyDisclosure(verify_args(t0() + Duration::days(1))),
        )
        .unwrap_err();
    assert_eq!(err, LedgerError::ConsentInvalid);
}
