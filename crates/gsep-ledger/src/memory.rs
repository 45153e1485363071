//! In-memory reference implementation of the ledger store.
//!
//! Deterministic and test-friendly. Durability-sensitive deployments use
//! the file-backed store.

use std::collections::HashMap;
use std::sync::RwLock;

use gsep_types::TransitionId;

use crate::error::LedgerError;
use crate::model::SealedLedger;
use crate::traits::LedgerStore;

#[derive(Default)]
pub struct InMemoryLedgerStore {
    sealed: RwLock<HashMap<TransitionId, SealedLedger>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn persist(&self, sealed: &SealedLedger) -> Result<(), LedgerError> {
        let mut guard = self.sealed.write().map_err(|_| LedgerError::Poisoned)?;
        guard.insert(sealed.transition_id, sealed.clone());
        Ok(())
    }

    fn load(&self, transition_id: &TransitionId) -> Result<Option<SealedLedger>, LedgerError> {
        let guard = self.sealed.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(guard.get(transition_id).cloned())
    }
}
