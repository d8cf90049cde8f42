//! Certificate records
//!
//! A certificate is an issuer-signed-off academic credential anchored on the
//! ledger. The record carries the descriptive payload, a content hash of the
//! off-ledger document, and the revocation state machine. Every field except
//! the revocation pair is immutable once issued.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::did::Did;

/// Unique identifier for a certificate, assigned by the issuer at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificateId(pub String);

impl CertificateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CertificateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Revocation state of a certificate
///
/// `Active --revoke(by issuer)--> Revoked` is the only transition; Revoked is
/// terminal. Records are never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Active,
    Revoked,
}

/// Accepted numeric range for a gpa value. Wide enough for 4.0/5.0
/// grade-point scales and 10-point scales alike.
pub const GPA_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Check that a gpa string parses as a finite number within [`GPA_RANGE`]
pub fn is_valid_gpa(raw: &str) -> bool {
    raw.trim()
        .parse::<f64>()
        .map(|gpa| gpa.is_finite() && GPA_RANGE.contains(&gpa))
        .unwrap_or(false)
}

/// An academic certificate anchored on the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Globally unique, caller-assigned identifier
    pub id: CertificateId,

    /// The issuing institution's DID; the only identity allowed to revoke
    pub issuer_did: Did,

    /// The credentialed student's DID
    pub student_did: Did,

    pub student_name: String,
    pub institution_name: String,
    pub degree: String,
    pub major: String,

    /// Numeric string, validated against [`GPA_RANGE`] at issuance
    pub gpa: String,

    pub graduation_date: NaiveDate,

    /// Hex SHA3-256 digest of the off-ledger certificate document
    pub certificate_hash: String,

    /// Optional pointer to the off-ledger blob (e.g. an IPFS CID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_reference: Option<String>,

    /// Open-ended additional claims; keys become disclosable field names
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Set from the issuing transaction's timestamp
    pub issuance_date: DateTime<Utc>,

    pub status: CertificateStatus,

    /// Set exactly once, on the Active → Revoked transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl Certificate {
    pub fn is_revoked(&self) -> bool {
        self.status == CertificateStatus::Revoked
    }

    /// Look up a disclosable field by its wire name
    ///
    /// Schema fields are matched first, then the certificate's own metadata
    /// keys. Returns `None` for unknown names and for an absent
    /// `ipfsReference`, so projections simply omit what is not there.
    pub fn field_value(&self, name: &str) -> Option<serde_json::Value> {
        let value = match name {
            "studentName" => serde_json::Value::String(self.student_name.clone()),
            "studentDid" => serde_json::Value::String(self.student_did.0.clone()),
            "institutionName" => serde_json::Value::String(self.institution_name.clone()),
            "degree" => serde_json::Value::String(self.degree.clone()),
            "major" => serde_json::Value::String(self.major.clone()),
            "gpa" => serde_json::Value::String(self.gpa.clone()),
            "graduationDate" => serde_json::Value::String(self.graduation_date.to_string()),
            "certificateHash" => serde_json::Value::String(self.certificate_hash.clone()),
            "ipfsReference" => serde_json::Value::String(self.ipfs_reference.clone()?),
            "issuanceDate" => serde_json::Value::String(self.issuance_date.to_rfc3339()),
            other => serde_json::Value::String(self.metadata.get(other)?.clone()),
        };
        Some(value)
    }
}
