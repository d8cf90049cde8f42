//! Document hashing
//!
//! The ledger stores only a content hash of the off-ledger certificate
//! document (the PDF itself lives in IPFS or similar). Clients compute the
//! hash with these helpers before submitting, and verifiers recompute it
//! for the tamper-evidence check.

use sha3::{Digest, Sha3_256};

/// Compute SHA3-256 hash
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the hex-encoded SHA3-256 digest of a certificate document
pub fn document_hash(data: &[u8]) -> String {
    hex::encode(sha3_256(data))
}
