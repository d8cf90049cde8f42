//! Certificate ledger
//!
//! Issuance, revocation, lookups, time-ordered queries, and the audit
//! history for certificate records. Mutating operations validate against a
//! snapshot and return a write-set; nothing is applied here.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vellum_core::certificate::is_valid_gpa;
use vellum_core::{Certificate, CertificateId, CertificateStatus, Did, LedgerError};
use vellum_state::{StateView, Version, WriteSet};

use crate::context::TxContext;
use crate::keys;

/// Arguments for issuing a certificate
///
/// The `issuer_did` is recorded on the certificate and must match the
/// transaction caller; every later revocation is checked against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateArgs {
    pub id: CertificateId,
    pub student_did: Did,
    pub student_name: String,
    pub issuer_did: Did,
    pub institution_name: String,
    pub degree: String,
    pub major: String,
    pub gpa: String,
    pub graduation_date: NaiveDate,
    pub certificate_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_reference: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// One committed state of a certificate, tagged with its transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateHistoryEntry {
    pub tx_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub certificate: Certificate,
}

/// Certificate lifecycle operations over a world-state snapshot
pub struct CertificateLedger<'a, S: StateView> {
    state: &'a S,
}

impl<'a, S: StateView> CertificateLedger<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self { state }
    }

    /// Issue a new certificate with `status = Active`
    ///
    /// Fails `AlreadyExists` if the id was ever used, by any certificate,
    /// active or revoked. The absence of the record key is part of the
    /// read-set, so two concurrent issues under the same id cannot both
    /// commit.
    pub fn issue(
        &self,
        ctx: &TxContext,
        args: IssueCertificateArgs,
    ) -> Result<(Certificate, WriteSet), LedgerError> {
        if !keys::is_valid_id(args.id.as_str()) {
            return Err(LedgerError::InvalidInput("certificate id".into()));
        }
        if !args.student_did.is_wellformed() {
            return Err(LedgerError::InvalidInput(format!(
                "malformed student DID: {}",
                args.student_did
            )));
        }
        if !args.issuer_did.is_wellformed() {
            return Err(LedgerError::InvalidInput(format!(
                "malformed issuer DID: {}",
                args.issuer_did
            )));
        }
        if args.certificate_hash.is_empty() {
            return Err(LedgerError::InvalidInput("certificate hash".into()));
        }
        if !is_valid_gpa(&args.gpa) {
            return Err(LedgerError::InvalidInput(format!("gpa: {:?}", args.gpa)));
        }
        if args.issuer_did != ctx.caller {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} cannot issue as {}",
                ctx.caller, args.issuer_did
            )));
        }

        let key = keys::certificate(&args.id);
        if self.state.get(&key).is_some() {
            return Err(LedgerError::AlreadyExists(args.id.0));
        }

        let certificate = Certificate {
            id: args.id,
            issuer_did: args.issuer_did,
            student_did: args.student_did,
            student_name: args.student_name,
            institution_name: args.institution_name,
            degree: args.degree,
            major: args.major,
            gpa: args.gpa,
            graduation_date: args.graduation_date,
            certificate_hash: args.certificate_hash,
            ipfs_reference: args.ipfs_reference,
            metadata: args.metadata,
            issuance_date: ctx.timestamp,
            status: CertificateStatus::Active,
            revoked_at: None,
            revocation_reason: None,
        };

        let mut writes = WriteSet::new();
        writes.record_read(key.as_str(), None);
        writes.put(key, serde_json::to_value(&certificate)?);
        writes.put(
            keys::cert_by_student(
                &certificate.student_did,
                certificate.issuance_date,
                &certificate.id,
            ),
            serde_json::Value::Null,
        );
        writes.put(
            keys::cert_by_institution(
                &certificate.issuer_did,
                certificate.issuance_date,
                &certificate.id,
            ),
            serde_json::Value::Null,
        );
        writes.emit(
            "CertificateIssued",
            json!({
                "certificateId": certificate.id,
                "studentDid": certificate.student_did,
                "issuerDid": certificate.issuer_did,
                "action": "ISSUED",
            }),
        );

        tracing::info!(certificate_id = %certificate.id, issuer = %certificate.issuer_did, "certificate issued");
        Ok((certificate, writes))
    }

    /// Read the full record, or fail `NotFound`
    pub fn read(&self, id: &CertificateId) -> Result<Certificate, LedgerError> {
        self.load(id).map(|(certificate, _)| certificate)
    }

    /// Flip an Active certificate to Revoked
    ///
    /// Only the recorded issuer may revoke. Re-revoking fails
    /// `AlreadyRevoked` so double-revocation attempts stay observable in the
    /// audit log instead of vanishing into an idempotent success.
    pub fn revoke(
        &self,
        ctx: &TxContext,
        id: &CertificateId,
        reason: Option<String>,
    ) -> Result<(Certificate, WriteSet), LedgerError> {
        let (mut certificate, version) = self.load(id)?;

        if certificate.issuer_did != ctx.caller {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} is not the issuer of {}",
                ctx.caller, id
            )));
        }
        if certificate.is_revoked() {
            return Err(LedgerError::AlreadyRevoked(id.0.clone()));
        }

        certificate.status = CertificateStatus::Revoked;
        certificate.revoked_at = Some(ctx.timestamp);
        certificate.revocation_reason = reason.clone();

        let mut writes = WriteSet::new();
        writes.record_read(keys::certificate(id), Some(version));
        writes.put(keys::certificate(id), serde_json::to_value(&certificate)?);
        writes.emit(
            "CertificateRevoked",
            json!({
                "certificateId": certificate.id,
                "action": "REVOKED",
                "revocationReason": reason,
            }),
        );

        tracing::info!(certificate_id = %certificate.id, "certificate revoked");
        Ok((certificate, writes))
    }

    /// Certificates issued by an institution, issuance date ascending
    pub fn query_by_institution(
        &self,
        issuer: &Did,
    ) -> Box<dyn Iterator<Item = Certificate> + '_> {
        self.scan(keys::cert_by_institution_prefix(issuer))
    }

    /// Certificates held by a student, issuance date ascending
    pub fn query_by_student(&self, student: &Did) -> Box<dyn Iterator<Item = Certificate> + '_> {
        self.scan(keys::cert_by_student_prefix(student))
    }

    /// Every committed version of a certificate, in commit order
    ///
    /// Read-only audit trail: issuance first, then the revocation if any.
    pub fn history(&self, id: &CertificateId) -> Result<Vec<CertificateHistoryEntry>, LedgerError> {
        let entries = self.state.history(&keys::certificate(id));
        if entries.is_empty() {
            return Err(LedgerError::NotFound(id.0.clone()));
        }
        entries
            .into_iter()
            .map(|entry| {
                Ok(CertificateHistoryEntry {
                    tx_id: entry.tx_id,
                    timestamp: entry.timestamp,
                    certificate: serde_json::from_value(entry.value)?,
                })
            })
            .collect()
    }

    pub(crate) fn load(&self, id: &CertificateId) -> Result<(Certificate, Version), LedgerError> {
        let stored = self
            .state
            .get(&keys::certificate(id))
            .ok_or_else(|| LedgerError::NotFound(id.0.clone()))?;
        let certificate = serde_json::from_value(stored.value)?;
        Ok((certificate, stored.version))
    }

    fn scan(&self, prefix: String) -> Box<dyn Iterator<Item = Certificate> + '_> {
        Box::new(self.state.scan_prefix(&prefix).filter_map(|(key, _)| {
            let id = CertificateId::new(keys::index_record_id(&key)?);
            // Dangling index entries are skipped, not surfaced
            self.load(&id).ok().map(|(certificate, _)| certificate)
        }))
    }
}
