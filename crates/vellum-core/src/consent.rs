//! Consent records
//!
//! A consent is a time-boxed, field-scoped authorization from a student
//! permitting one verifier to see specified fields of one certificate.
//! Scope is fixed at creation; revoke-and-regrant is the only way to change
//! it. Expiry is a derived, read-time condition, never a stored state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certificate::CertificateId;
use crate::did::Did;

/// Unique identifier for a consent grant, assigned by the student
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsentId(pub String);

impl ConsentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConsentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConsentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stored lifecycle state of a consent
///
/// There is no `Expired` variant: expiry is computed from `expiry_date` at
/// read time and never written back, so revocation stays the only mutation
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    Active,
    Revoked,
}

/// A consent grant from a student to a verifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    pub id: ConsentId,

    /// The granting student; the only identity allowed to revoke
    pub student_did: Did,

    /// The verifier this grant names; no other verifier can use it
    pub verifier_did: Did,

    pub certificate_id: CertificateId,

    /// Free-text justification ("employment", "transfer", ...)
    pub purpose: String,

    /// Field names the verifier is authorized to see, filtered against the
    /// certificate's disclosable fields at grant time
    pub data_shared: BTreeSet<String>,

    pub granted_at: DateTime<Utc>,

    /// `granted_at + validity_days`, computed at creation
    pub expiry_date: DateTime<Utc>,

    pub status: ConsentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl Consent {
    pub fn is_revoked(&self) -> bool {
        self.status == ConsentStatus::Revoked
    }

    /// The pure validity predicate: Active, named verifier, not yet expired
    /// as of the supplied instant. This predicate, not any stored flag, is
    /// the single source of truth for expiry.
    pub fn is_valid_for(&self, verifier: &Did, as_of: DateTime<Utc>) -> bool {
        self.status == ConsentStatus::Active
            && &self.verifier_did == verifier
            && as_of < self.expiry_date
    }

    /// How much of the validity window remains at `as_of`
    pub fn remaining_validity(&self, as_of: DateTime<Utc>) -> chrono::Duration {
        self.expiry_date - as_of
    }
}
