//! Transaction API
//!
//! The closed set of operations external callers can submit, as a tagged
//! union dispatched by an explicit match. Requests arrive as
//! `{"function": "...", "args": {...}}`; aliases keep the names earlier
//! clients used (`VerifyConsent`, `AccessCertificateWithConsent`,
//! `VerifyCertificate`) routable to the same operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vellum_core::{CertificateId, ConsentId, Did, LedgerError};
use vellum_state::{StateView, WriteSet};

use crate::certificate::{CertificateLedger, IssueCertificateArgs};
use crate::consent::{ConsentLedger, GrantConsentArgs};
use crate::context::TxContext;
use crate::disclosure::DisclosureVerifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadCertificateArgs {
    pub certificate_id: CertificateId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCertificateArgs {
    pub certificate_id: CertificateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCertificatesByInstitutionArgs {
    pub issuer_did: Did,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCertificatesByStudentArgs {
    pub student_did: Did,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCertificateHistoryArgs {
    pub certificate_id: CertificateId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeConsentArgs {
    pub consent_id: ConsentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadConsentArgs {
    pub consent_id: ConsentId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConsentsByStudentArgs {
    pub student_did: Did,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConsentsByVerifierArgs {
    pub verifier_did: Did,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsConsentValidArgs {
    pub consent_id: ConsentId,
    pub verifier_did: Did,
    /// Defaults to the transaction timestamp when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDisclosureArgs {
    pub certificate_id: CertificateId,
    pub consent_id: ConsentId,
    pub verifier_did: Did,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickVerifyArgs {
    pub certificate_id: CertificateId,
    pub expected_hash: String,
}

/// One submitted operation with its typed arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", content = "args")]
pub enum Transaction {
    IssueCertificate(IssueCertificateArgs),
    ReadCertificate(ReadCertificateArgs),
    RevokeCertificate(RevokeCertificateArgs),
    QueryCertificatesByInstitution(QueryCertificatesByInstitutionArgs),
    QueryCertificatesByStudent(QueryCertificatesByStudentArgs),
    GetCertificateHistory(GetCertificateHistoryArgs),
    GrantConsent(GrantConsentArgs),
    RevokeConsent(RevokeConsentArgs),
    ReadConsent(ReadConsentArgs),
    QueryConsentsByStudent(QueryConsentsByStudentArgs),
    QueryConsentsByVerifier(QueryConsentsByVerifierArgs),
    #[serde(alias = "VerifyConsent")]
    IsConsentValid(IsConsentValidArgs),
    #[serde(alias = "AccessCertificateWithConsent")]
    VerifyDisclosure(VerifyDisclosureArgs),
    #[serde(alias = "VerifyCertificate")]
    QuickVerify(QuickVerifyArgs),
}

/// The outcome of executing a transaction against a snapshot
///
/// `writes` is empty for read-only operations. The runtime serializes
/// `result` back to the caller and commits `writes` if the read-set is
/// still current.
#[derive(Debug, Clone, PartialEq)]
pub struct TxReceipt {
    pub result: serde_json::Value,
    pub writes: WriteSet,
}

impl TxReceipt {
    fn read_only(result: serde_json::Value) -> Self {
        Self {
            result,
            writes: WriteSet::new(),
        }
    }
}

impl Transaction {
    /// Parse a JSON request body
    pub fn from_request(body: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(body).map_err(|err| LedgerError::InvalidInput(err.to_string()))
    }

    /// The canonical operation name
    pub fn function(&self) -> &'static str {
        match self {
            Transaction::IssueCertificate(_) => "IssueCertificate",
            Transaction::ReadCertificate(_) => "ReadCertificate",
            Transaction::RevokeCertificate(_) => "RevokeCertificate",
            Transaction::QueryCertificatesByInstitution(_) => "QueryCertificatesByInstitution",
            Transaction::QueryCertificatesByStudent(_) => "QueryCertificatesByStudent",
            Transaction::GetCertificateHistory(_) => "GetCertificateHistory",
            Transaction::GrantConsent(_) => "GrantConsent",
            Transaction::RevokeConsent(_) => "RevokeConsent",
            Transaction::ReadConsent(_) => "ReadConsent",
            Transaction::QueryConsentsByStudent(_) => "QueryConsentsByStudent",
            Transaction::QueryConsentsByVerifier(_) => "QueryConsentsByVerifier",
            Transaction::IsConsentValid(_) => "IsConsentValid",
            Transaction::VerifyDisclosure(_) => "VerifyDisclosure",
            Transaction::QuickVerify(_) => "QuickVerify",
        }
    }

    /// Execute against a snapshot, producing a result and a write-set
    ///
    /// Pure with respect to the snapshot: identical arguments, context, and
    /// state yield an identical receipt on every node.
    pub fn execute<S: StateView>(
        self,
        state: &S,
        ctx: &TxContext,
    ) -> Result<TxReceipt, LedgerError> {
        match self {
            Transaction::IssueCertificate(args) => {
                let (certificate, writes) = CertificateLedger::new(state).issue(ctx, args)?;
                Ok(TxReceipt {
                    result: serde_json::to_value(certificate)?,
                    writes,
                })
            }
            Transaction::ReadCertificate(args) => {
                let certificate = CertificateLedger::new(state).read(&args.certificate_id)?;
                Ok(TxReceipt::read_only(serde_json::to_value(certificate)?))
            }
            Transaction::RevokeCertificate(args) => {
                let (certificate, writes) =
                    CertificateLedger::new(state).revoke(ctx, &args.certificate_id, args.reason)?;
                Ok(TxReceipt {
                    result: serde_json::to_value(certificate)?,
                    writes,
                })
            }
            Transaction::QueryCertificatesByInstitution(args) => {
                let certificates: Vec<_> = CertificateLedger::new(state)
                    .query_by_institution(&args.issuer_did)
                    .collect();
                Ok(TxReceipt::read_only(serde_json::to_value(certificates)?))
            }
            Transaction::QueryCertificatesByStudent(args) => {
                let certificates: Vec<_> = CertificateLedger::new(state)
                    .query_by_student(&args.student_did)
                    .collect();
                Ok(TxReceipt::read_only(serde_json::to_value(certificates)?))
            }
            Transaction::GetCertificateHistory(args) => {
                let history = CertificateLedger::new(state).history(&args.certificate_id)?;
                Ok(TxReceipt::read_only(serde_json::to_value(history)?))
            }
            Transaction::GrantConsent(args) => {
                let (consent, writes) = ConsentLedger::new(state).grant(ctx, args)?;
                Ok(TxReceipt {
                    result: serde_json::to_value(consent)?,
                    writes,
                })
            }
            Transaction::RevokeConsent(args) => {
                let (consent, writes) =
                    ConsentLedger::new(state).revoke(ctx, &args.consent_id, args.reason)?;
                Ok(TxReceipt {
                    result: serde_json::to_value(consent)?,
                    writes,
                })
            }
            Transaction::ReadConsent(args) => {
                let consent = ConsentLedger::new(state).read(&args.consent_id)?;
                Ok(TxReceipt::read_only(serde_json::to_value(consent)?))
            }
            Transaction::QueryConsentsByStudent(args) => {
                let consents: Vec<_> = ConsentLedger::new(state)
                    .query_by_student(&args.student_did)
                    .collect();
                Ok(TxReceipt::read_only(serde_json::to_value(consents)?))
            }
            Transaction::QueryConsentsByVerifier(args) => {
                let consents: Vec<_> = ConsentLedger::new(state)
                    .query_by_verifier(&args.verifier_did)
                    .collect();
                Ok(TxReceipt::read_only(serde_json::to_value(consents)?))
            }
            Transaction::IsConsentValid(args) => {
                let as_of = args.as_of.unwrap_or(ctx.timestamp);
                let valid =
                    ConsentLedger::new(state).is_valid(&args.consent_id, &args.verifier_did, as_of);
                Ok(TxReceipt::read_only(serde_json::Value::Bool(valid)))
            }
            Transaction::VerifyDisclosure(args) => {
                let as_of = args.as_of.unwrap_or(ctx.timestamp);
                let disclosure = DisclosureVerifier::new(state).verify(
                    &args.certificate_id,
                    &args.consent_id,
                    &args.verifier_did,
                    as_of,
                )?;
                Ok(TxReceipt::read_only(serde_json::to_value(disclosure)?))
            }
            Transaction::QuickVerify(args) => {
                let report = DisclosureVerifier::new(state)
                    .quick_verify(&args.certificate_id, &args.expected_hash)?;
                Ok(TxReceipt::read_only(serde_json::to_value(report)?))
            }
        }
    }
}
