//! Certificate field schema
//!
//! A fixed, versioned list of the legal disclosable field names. Consent
//! scopes are filtered against this schema (plus the certificate's own
//! metadata keys) when the grant is created, so a verifier can never be
//! granted a field that does not exist.

use std::collections::BTreeSet;

use crate::certificate::Certificate;

/// Schema identifier for the v1 certificate field set
pub const CERTIFICATE_SCHEMA_V1: &str = "vellum:certificate:v1";

/// Disclosable schema fields, by wire name
pub const DISCLOSABLE_FIELDS_V1: &[&str] = &[
    "studentName",
    "studentDid",
    "institutionName",
    "degree",
    "major",
    "gpa",
    "graduationDate",
    "certificateHash",
    "ipfsReference",
    "issuanceDate",
];

/// Whether `field` names something disclosable on this certificate: a v1
/// schema field or one of the certificate's metadata keys
pub fn is_disclosable(certificate: &Certificate, field: &str) -> bool {
    DISCLOSABLE_FIELDS_V1.contains(&field) || certificate.metadata.contains_key(field)
}

/// Filter a requested consent scope down to fields that exist on the
/// certificate. Unknown names are dropped, not rejected; an empty result
/// means the caller asked for nothing real and the grant must fail upstream.
pub fn filter_scope<I, S>(certificate: &Certificate, requested: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    requested
        .into_iter()
        .map(Into::into)
        .filter(|field| is_disclosable(certificate, field))
        .collect()
}
