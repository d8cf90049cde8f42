//! Consent ledger
//!
//! Grants, revocations, queries, and the validity predicate for consent
//! records. Granting reads the certificate ledger (never the other way
//! around) to check that the consent references a real certificate owned by
//! the granting student.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use vellum_core::{schema, Consent, ConsentId, ConsentStatus, Did, LedgerError};
use vellum_state::{StateView, Version, WriteSet};

use crate::certificate::CertificateLedger;
use crate::context::TxContext;
use crate::keys;

/// Arguments for granting consent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantConsentArgs {
    pub id: ConsentId,
    pub student_did: Did,
    pub verifier_did: Did,
    pub certificate_id: vellum_core::CertificateId,
    pub purpose: String,

    /// Requested field scope; entries that name nothing on the certificate
    /// are dropped at grant time
    pub data_shared: Vec<String>,

    pub validity_days: i64,
}

/// Consent lifecycle operations over a world-state snapshot
pub struct ConsentLedger<'a, S: StateView> {
    state: &'a S,
}

impl<'a, S: StateView> ConsentLedger<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self { state }
    }

    /// Grant a verifier time-boxed, field-scoped access to one certificate
    ///
    /// The stored scope is the requested scope filtered against the
    /// certificate's disclosable fields; if nothing survives the filter the
    /// call fails `InvalidInput` rather than storing an empty grant.
    pub fn grant(
        &self,
        ctx: &TxContext,
        args: GrantConsentArgs,
    ) -> Result<(Consent, WriteSet), LedgerError> {
        if !keys::is_valid_id(args.id.as_str()) {
            return Err(LedgerError::InvalidInput("consent id".into()));
        }
        if args.validity_days <= 0 {
            return Err(LedgerError::InvalidInput(format!(
                "validity days: {}",
                args.validity_days
            )));
        }
        if args.data_shared.is_empty() {
            return Err(LedgerError::InvalidInput("empty data scope".into()));
        }
        if !args.student_did.is_wellformed() {
            return Err(LedgerError::InvalidInput(format!(
                "malformed student DID: {}",
                args.student_did
            )));
        }
        if !args.verifier_did.is_wellformed() {
            return Err(LedgerError::InvalidInput(format!(
                "malformed verifier DID: {}",
                args.verifier_did
            )));
        }
        if args.student_did != ctx.caller {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} cannot grant consent as {}",
                ctx.caller, args.student_did
            )));
        }

        let key = keys::consent(&args.id);
        if self.state.get(&key).is_some() {
            return Err(LedgerError::AlreadyExists(args.id.0));
        }

        let certificates = CertificateLedger::new(self.state);
        let (certificate, cert_version) = certificates.load(&args.certificate_id)?;
        if certificate.student_did != args.student_did {
            return Err(LedgerError::Unauthorized(format!(
                "certificate {} does not belong to {}",
                args.certificate_id, args.student_did
            )));
        }

        let data_shared = schema::filter_scope(&certificate, args.data_shared);
        if data_shared.is_empty() {
            return Err(LedgerError::InvalidInput(
                "no requested field exists on the certificate".into(),
            ));
        }

        let consent = Consent {
            id: args.id,
            student_did: args.student_did,
            verifier_did: args.verifier_did,
            certificate_id: args.certificate_id,
            purpose: args.purpose,
            data_shared,
            granted_at: ctx.timestamp,
            expiry_date: ctx.timestamp + Duration::days(args.validity_days),
            status: ConsentStatus::Active,
            revoked_at: None,
            revocation_reason: None,
        };

        let mut writes = WriteSet::new();
        writes.record_read(key.as_str(), None);
        // The ownership check above depends on the certificate as read;
        // record it so a conflicting certificate write aborts this grant.
        writes.record_read(keys::certificate(&consent.certificate_id), Some(cert_version));
        writes.put(key, serde_json::to_value(&consent)?);
        writes.put(
            keys::consent_by_student(&consent.student_did, consent.granted_at, &consent.id),
            serde_json::Value::Null,
        );
        writes.put(
            keys::consent_by_verifier(&consent.verifier_did, consent.granted_at, &consent.id),
            serde_json::Value::Null,
        );
        writes.emit(
            "ConsentGranted",
            json!({
                "consentId": consent.id,
                "studentDid": consent.student_did,
                "verifierDid": consent.verifier_did,
                "certificateId": consent.certificate_id,
                "action": "GRANTED",
            }),
        );

        tracing::info!(consent_id = %consent.id, student = %consent.student_did, verifier = %consent.verifier_did, "consent granted");
        Ok((consent, writes))
    }

    /// Read the full record, or fail `NotFound`
    pub fn read(&self, id: &ConsentId) -> Result<Consent, LedgerError> {
        self.load(id).map(|(consent, _)| consent)
    }

    /// Revoke a consent; only the granting student may do so
    pub fn revoke(
        &self,
        ctx: &TxContext,
        id: &ConsentId,
        reason: Option<String>,
    ) -> Result<(Consent, WriteSet), LedgerError> {
        let (mut consent, version) = self.load(id)?;

        if consent.student_did != ctx.caller {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} did not grant consent {}",
                ctx.caller, id
            )));
        }
        if consent.is_revoked() {
            return Err(LedgerError::AlreadyRevoked(id.0.clone()));
        }

        consent.status = ConsentStatus::Revoked;
        consent.revoked_at = Some(ctx.timestamp);
        consent.revocation_reason = reason.clone();

        let mut writes = WriteSet::new();
        writes.record_read(keys::consent(id), Some(version));
        writes.put(keys::consent(id), serde_json::to_value(&consent)?);
        writes.emit(
            "ConsentRevoked",
            json!({
                "consentId": consent.id,
                "verifierDid": consent.verifier_did,
                "action": "REVOKED",
                "revocationReason": reason,
            }),
        );

        tracing::info!(consent_id = %consent.id, "consent revoked");
        Ok((consent, writes))
    }

    /// Consents granted by a student, grant time ascending
    pub fn query_by_student(&self, student: &Did) -> Box<dyn Iterator<Item = Consent> + '_> {
        self.scan(keys::consent_by_student_prefix(student))
    }

    /// Consents granted to a verifier, grant time ascending
    pub fn query_by_verifier(&self, verifier: &Did) -> Box<dyn Iterator<Item = Consent> + '_> {
        self.scan(keys::consent_by_verifier_prefix(verifier))
    }

    /// The validity predicate: the consent exists, is Active, names this
    /// verifier, and has not expired as of `as_of`
    ///
    /// Expiry is decided here and only here; it is never written back to the
    /// record.
    pub fn is_valid(&self, id: &ConsentId, verifier: &Did, as_of: DateTime<Utc>) -> bool {
        match self.load(id) {
            Ok((consent, _)) => consent.is_valid_for(verifier, as_of),
            Err(_) => false,
        }
    }

    pub(crate) fn load(&self, id: &ConsentId) -> Result<(Consent, Version), LedgerError> {
        let stored = self
            .state
            .get(&keys::consent(id))
            .ok_or_else(|| LedgerError::NotFound(id.0.clone()))?;
        let consent = serde_json::from_value(stored.value)?;
        Ok((consent, stored.version))
    }

    fn scan(&self, prefix: String) -> Box<dyn Iterator<Item = Consent> + '_> {
        Box::new(self.state.scan_prefix(&prefix).filter_map(|(key, _)| {
            let id = ConsentId::new(keys::index_record_id(&key)?);
            self.load(&id).ok().map(|(consent, _)| consent)
        }))
    }
}
