//! Vellum Core
//!
//! Core domain types for the Vellum credential ledger.
//! This crate defines the records, field schema, and error taxonomy shared
//! by every component of the system.

pub mod certificate;
pub mod consent;
pub mod did;
pub mod error;
pub mod hash;
pub mod schema;

pub use certificate::{Certificate, CertificateId, CertificateStatus};
pub use consent::{Consent, ConsentId, ConsentStatus};
pub use did::Did;
pub use error::LedgerError;
pub use schema::{CERTIFICATE_SCHEMA_V1, DISCLOSABLE_FIELDS_V1};
