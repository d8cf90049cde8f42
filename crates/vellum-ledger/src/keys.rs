//! World-state key scheme
//!
//! Records live under `cert:`/`consent:` prefixes. Secondary indices are
//! composite keys whose segments are joined by a NUL separator, the same
//! trick as Fabric composite keys: NUL cannot appear in a valid id, so
//! segments never bleed into each other. Index keys embed a zero-padded
//! millisecond timestamp, making an ordered prefix scan return records in
//! time order.

use chrono::{DateTime, Utc};
use vellum_core::{CertificateId, ConsentId, Did};

const SEP: char = '\u{0}';

pub fn certificate(id: &CertificateId) -> String {
    format!("cert:{}", id.as_str())
}

pub fn consent(id: &ConsentId) -> String {
    format!("consent:{}", id.as_str())
}

fn index(name: &str, owner: &Did, at: DateTime<Utc>, id: &str) -> String {
    format!(
        "idx:{name}{SEP}{owner}{SEP}{:015}{SEP}{id}",
        at.timestamp_millis()
    )
}

fn index_prefix(name: &str, owner: &Did) -> String {
    format!("idx:{name}{SEP}{owner}{SEP}")
}

pub fn cert_by_student(student: &Did, issued_at: DateTime<Utc>, id: &CertificateId) -> String {
    index("cert:student", student, issued_at, id.as_str())
}

pub fn cert_by_student_prefix(student: &Did) -> String {
    index_prefix("cert:student", student)
}

pub fn cert_by_institution(issuer: &Did, issued_at: DateTime<Utc>, id: &CertificateId) -> String {
    index("cert:institution", issuer, issued_at, id.as_str())
}

pub fn cert_by_institution_prefix(issuer: &Did) -> String {
    index_prefix("cert:institution", issuer)
}

pub fn consent_by_student(student: &Did, granted_at: DateTime<Utc>, id: &ConsentId) -> String {
    index("consent:student", student, granted_at, id.as_str())
}

pub fn consent_by_student_prefix(student: &Did) -> String {
    index_prefix("consent:student", student)
}

pub fn consent_by_verifier(verifier: &Did, granted_at: DateTime<Utc>, id: &ConsentId) -> String {
    index("consent:verifier", verifier, granted_at, id.as_str())
}

pub fn consent_by_verifier_prefix(verifier: &Did) -> String {
    index_prefix("consent:verifier", verifier)
}

/// The record id segment of a composite index key
pub fn index_record_id(key: &str) -> Option<&str> {
    key.rsplit(SEP).next().filter(|id| !id.is_empty())
}

/// Ids become key segments, so they must be printable and NUL-free
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(SEP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_index_keys_sort_by_time() {
        let student = Did::new("did:web:student:STU001");
        let earlier = cert_by_student(
            &student,
            ts("2024-01-01T00:00:00Z"),
            &CertificateId::new("CERT-B"),
        );
        let later = cert_by_student(
            &student,
            ts("2024-06-01T00:00:00Z"),
            &CertificateId::new("CERT-A"),
        );
        assert!(earlier < later);
        assert!(earlier.starts_with(&cert_by_student_prefix(&student)));
    }

    #[test]
    fn test_prefix_does_not_match_longer_did() {
        // "did:web:a" must not capture "did:web:a:b" index entries
        let short = cert_by_student_prefix(&Did::new("did:web:a"));
        let long_key = cert_by_student(
            &Did::new("did:web:a:b"),
            ts("2024-01-01T00:00:00Z"),
            &CertificateId::new("CERT-1"),
        );
        assert!(!long_key.starts_with(&short));
    }

    #[test]
    fn test_index_record_id_roundtrip() {
        let key = consent_by_verifier(
            &Did::new("did:web:employer.example"),
            ts("2024-01-01T00:00:00Z"),
            &ConsentId::new("CONS-001"),
        );
        assert_eq!(index_record_id(&key), Some("CONS-001"));
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("CERT-001"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("CERT\u{0}001"));
    }
}
