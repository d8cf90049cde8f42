//! Decentralized identifier references
//!
//! DIDs name the three parties of the system: students, issuers, and
//! verifiers. The core treats them as opaque strings already authenticated
//! upstream; only the syntax is checked here, never cryptographic validity.

use serde::{Deserialize, Serialize};

/// An opaque decentralized identifier for a student, issuer, or verifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Did(pub String);

impl Did {
    pub fn new(did: impl Into<String>) -> Self {
        Self(did.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Syntax-only check: `did:<method>:<identifier>` with non-empty parts.
    ///
    /// Authentication happens upstream; a well-formed DID is trusted as the
    /// caller's identity.
    pub fn is_wellformed(&self) -> bool {
        let mut parts = self.0.splitn(3, ':');
        matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty()
        )
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Did {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
