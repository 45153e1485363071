//! Forensic Ledger (FL) - durable, append-only record of every artifact
//! produced during one pipeline transition.
//!
//! The in-memory ledger for a transition is owned exclusively by this crate
//! until `finalize_transition` persists it as a single sealed unit; only a
//! confirmed flush clears the accumulated records. Rollback retrieval
//! re-verifies every stored artifact digest before a record is trusted.

#![deny(unsafe_code)]

mod error;
mod file;
mod ledger;
mod memory;
mod model;
mod traits;

pub use error::LedgerError;
pub use file::FileLedgerStore;
pub use ledger::ForensicLedger;
pub use memory::InMemoryLedgerStore;
pub use model::SealedLedger;
pub use traits::LedgerStore;
