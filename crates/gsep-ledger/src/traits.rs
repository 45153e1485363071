use gsep_types::TransitionId;

use crate::error::LedgerError;
use crate::model::SealedLedger;

/// Durable storage backend for sealed transition ledgers.
pub trait LedgerStore: Send + Sync {
    /// Persist a sealed ledger as one durable unit.
    ///
    /// Must not return `Ok` until the data is confirmed on the backing
    /// medium; a crash mid-persist must leave the transition either fully
    /// persisted or absent, never partially visible.
    fn persist(&self, sealed: &SealedLedger) -> Result<(), LedgerError>;

    /// Load the sealed ledger for a transition, if one exists.
    fn load(&self, transition_id: &TransitionId) -> Result<Option<SealedLedger>, LedgerError>;
}
