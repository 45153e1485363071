//! Canonical serialization and digest primitives for GSEP-C.
//!
//! Every hash in the pipeline goes through this crate: the stage-chain
//! manager, the forensic ledger, and the sentinel all share one
//! canonicalization routine and one digest algorithm (BLAKE3, hex-encoded,
//! domain-separated). Two semantically equal structures always produce
//! identical bytes, and therefore identical digests.

#![deny(unsafe_code)]

pub mod canonical;
pub mod digest;

pub use canonical::{canonicalize, CanonicalError};
pub use digest::{artifact_digest, digest_hex, key_digest, ARTIFACT_DOMAIN, KEY_DOMAIN, LOCK_DOMAIN};
