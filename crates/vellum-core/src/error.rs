//! Error types for Vellum

use thiserror::Error;

/// Main error type for ledger operations
///
/// Every failure aborts the whole transaction; no variant is ever converted
/// into a default value or retried inside the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("already revoked: {0}")]
    AlreadyRevoked(String),

    /// Composite verdict covering missing, revoked, expired, and
    /// wrong-verifier consent. Callers are told only "invalid" so the
    /// disclosure path cannot be used as an oracle into consent internals.
    #[error("consent invalid")]
    ConsentInvalid,

    #[error("consent is bound to certificate {expected}, not {found}")]
    CertificateMismatch { expected: String, found: String },

    #[error("certificate revoked: {0}")]
    CertificateRevoked(String),

    /// A stored record failed to decode. This indicates corrupted world
    /// state, not caller error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Stable machine-readable error kind, surfaced verbatim on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidInput(_) => "INVALID_INPUT",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::AlreadyExists(_) => "ALREADY_EXISTS",
            LedgerError::Unauthorized(_) => "UNAUTHORIZED",
            LedgerError::AlreadyRevoked(_) => "ALREADY_REVOKED",
            LedgerError::ConsentInvalid => "CONSENT_INVALID",
            LedgerError::CertificateMismatch { .. } => "CERTIFICATE_MISMATCH",
            LedgerError::CertificateRevoked(_) => "CERTIFICATE_REVOKED",
            LedgerError::Serialization(_) => "SERIALIZATION",
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
