//! Disclosure verifier
//!
//! The composite protocol a relying party invokes to learn certificate
//! facts. Composes the consent validity predicate with certificate lookups
//! and projects the record onto exactly the consented fields. Read-only:
//! verification never writes either ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vellum_core::{CertificateId, CertificateStatus, ConsentId, Did, LedgerError};
use vellum_state::StateView;

use crate::certificate::CertificateLedger;
use crate::consent::ConsentLedger;

/// The field-filtered certificate view produced by a successful disclosure
///
/// Provenance (`status`, issuer, institution) is always visible; everything
/// else appears in `fields` only if the consent named it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disclosure {
    pub certificate_id: CertificateId,
    pub status: CertificateStatus,
    pub issuer_did: Did,
    pub institution_name: String,

    /// Exactly the consented fields present on the certificate
    pub fields: BTreeMap<String, serde_json::Value>,

    /// When the consent backing this disclosure lapses
    pub consent_expires_at: DateTime<Utc>,

    /// Seconds of the consent's validity window left at `as_of`
    pub remaining_validity_secs: i64,
}

/// Result of the public tamper-evidence check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickVerification {
    pub certificate_id: CertificateId,
    pub status: CertificateStatus,

    /// Whether the presented document hash equals the anchored one
    pub hash_matches: bool,
}

/// Stateless coordinator over the two ledgers
pub struct DisclosureVerifier<'a, S: StateView> {
    state: &'a S,
}

impl<'a, S: StateView> DisclosureVerifier<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self { state }
    }

    /// Full consent-mediated disclosure
    ///
    /// Any consent problem (missing, revoked, expired, wrong verifier)
    /// surfaces as the single `ConsentInvalid` error, so a caller cannot
    /// probe consent internals through this path. A revoked certificate
    /// blocks disclosure unconditionally, valid consent or not.
    pub fn verify(
        &self,
        certificate_id: &CertificateId,
        consent_id: &ConsentId,
        verifier: &Did,
        as_of: DateTime<Utc>,
    ) -> Result<Disclosure, LedgerError> {
        let consents = ConsentLedger::new(self.state);
        if !consents.is_valid(consent_id, verifier, as_of) {
            return Err(LedgerError::ConsentInvalid);
        }

        let consent = consents.read(consent_id)?;
        if &consent.certificate_id != certificate_id {
            return Err(LedgerError::CertificateMismatch {
                expected: consent.certificate_id.0,
                found: certificate_id.0.clone(),
            });
        }

        let certificate = CertificateLedger::new(self.state).read(certificate_id)?;
        if certificate.is_revoked() {
            return Err(LedgerError::CertificateRevoked(certificate_id.0.clone()));
        }

        let fields = consent
            .data_shared
            .iter()
            .filter_map(|name| Some((name.clone(), certificate.field_value(name)?)))
            .collect();

        tracing::debug!(
            certificate_id = %certificate.id,
            consent_id = %consent.id,
            verifier = %verifier,
            "disclosure produced"
        );
        Ok(Disclosure {
            certificate_id: certificate.id,
            status: certificate.status,
            issuer_did: certificate.issuer_did,
            institution_name: certificate.institution_name,
            fields,
            consent_expires_at: consent.expiry_date,
            remaining_validity_secs: consent.remaining_validity(as_of).num_seconds(),
        })
    }

    /// Public tamper-evidence check: status plus hash equality
    ///
    /// Requires no consent and reveals no granular fields. Fails the same
    /// way as full disclosure for a missing or revoked certificate; a
    /// mismatched hash is an answer, not an error.
    pub fn quick_verify(
        &self,
        certificate_id: &CertificateId,
        expected_hash: &str,
    ) -> Result<QuickVerification, LedgerError> {
        let certificate = CertificateLedger::new(self.state).read(certificate_id)?;
        if certificate.is_revoked() {
            return Err(LedgerError::CertificateRevoked(certificate_id.0.clone()));
        }

        Ok(QuickVerification {
            hash_matches: certificate.certificate_hash == expected_hash,
            certificate_id: certificate.id,
            status: certificate.status,
        })
    }
}
