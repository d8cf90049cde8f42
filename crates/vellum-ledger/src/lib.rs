//! Vellum Ledger
//!
//! The deterministic state-transition logic of the credential ledger:
//! certificate lifecycle, consent lifecycle, and the consent-mediated
//! disclosure protocol. Every operation is a pure function from
//! `(arguments, state snapshot, transaction context)` to a result plus a
//! write-set; ordering, commit, and replication belong to the runtime.

pub mod certificate;
pub mod consent;
pub mod context;
pub mod disclosure;
pub mod keys;
pub mod tx;

pub use certificate::{CertificateHistoryEntry, CertificateLedger, IssueCertificateArgs};
pub use consent::{ConsentLedger, GrantConsentArgs};
pub use context::TxContext;
pub use disclosure::{Disclosure, DisclosureVerifier, QuickVerification};
pub use tx::{Transaction, TxReceipt};
