use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use gsep_crypto::artifact_digest;
use gsep_types::{
    AgentId, ArtifactDigest, FinalStatus, LedgerId, StageArtifactRecord, StageId, TransitionId,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::model::SealedLedger;
use crate::traits::LedgerStore;

/// The forensic ledger: accumulates stage artifact records per transition
/// and seals them durably exactly once.
///
/// Concurrent transitions each own an independent record sequence keyed by
/// `transition_id`.
pub struct ForensicLedger {
    store: Arc<dyn LedgerStore>,
    active: RwLock<HashMap<TransitionId, Vec<StageArtifactRecord>>>,
}

impl ForensicLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            active: RwLock::new(HashMap::new()),
        }
    }

    /// Record one stage output artifact in the transition's in-memory
    /// ledger. No persistence happens here; the only failure mode is
    /// unserializable input.
    ///
    /// Returns the computed artifact digest so callers can commit it
    /// without re-hashing.
    pub fn stage_artifact(
        &self,
        transition_id: TransitionId,
        stage_id: StageId,
        agent_id: &AgentId,
        artifact_name: &str,
        artifact: &Value,
    ) -> Result<ArtifactDigest, LedgerError> {
        let digest =
            artifact_digest(artifact).map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let record = StageArtifactRecord {
            transition_id,
            stage_id,
            agent_id: agent_id.clone(),
            artifact_name: artifact_name.to_string(),
            artifact_digest: digest.clone(),
            raw_artifact: artifact.clone(),
            recorded_at: Utc::now(),
        };

        let mut active = self.active.write().map_err(|_| LedgerError::Poisoned)?;
        active.entry(transition_id).or_default().push(record);
        debug!(transition = %transition_id, stage = %stage_id, artifact = artifact_name, "artifact staged");
        Ok(digest)
    }

    /// Number of records accumulated for a transition.
    pub fn record_count(&self, transition_id: &TransitionId) -> usize {
        self.active
            .read()
            .map(|a| a.get(transition_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Seal the transition's accumulated ledger as one durable unit.
    ///
    /// The in-memory records are cleared only after the store confirms
    /// persistence; on failure the transition is not finalized and the
    /// records stay intact for a later forensic pass.
    pub fn finalize_transition(
        &self,
        transition_id: TransitionId,
        final_status: FinalStatus,
        receipt: Value,
    ) -> Result<LedgerId, LedgerError> {
        if self.store.load(&transition_id)?.is_some() {
            return Err(LedgerError::AlreadySealed(transition_id));
        }

        let records = {
            let active = self.active.read().map_err(|_| LedgerError::Poisoned)?;
            active.get(&transition_id).cloned().unwrap_or_default()
        };

        let sealed = SealedLedger {
            ledger_id: LedgerId::generate(),
            transition_id,
            final_status,
            receipt,
            records,
            sealed_at: Utc::now(),
        };

        if let Err(e) = self.store.persist(&sealed) {
            warn!(transition = %transition_id, error = %e, "ledger persistence failed; transition not finalized");
            return Err(e);
        }

        // Ownership of the records passes to durable storage.
        let mut active = self.active.write().map_err(|_| LedgerError::Poisoned)?;
        active.remove(&transition_id);

        info!(
            transition = %transition_id,
            ledger = %sealed.ledger_id,
            status = %final_status,
            records = sealed.records.len(),
            "transition ledger sealed"
        );
        Ok(sealed.ledger_id)
    }

    /// Reconstruct the sealed state of a transition for the rollback
    /// executor.
    ///
    /// Every record's stored digest is re-verified against a fresh digest
    /// of its raw artifact; a single mismatch fails the whole retrieval so
    /// tampered snapshots are never trusted.
    pub fn retrieve_rollback_state(
        &self,
        transition_id: &TransitionId,
    ) -> Result<Vec<StageArtifactRecord>, LedgerError> {
        let sealed = self
            .store
            .load(transition_id)?
            .ok_or(LedgerError::UnknownTransition(*transition_id))?;

        for record in &sealed.records {
            let recomputed = artifact_digest(&record.raw_artifact)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
            if recomputed != record.artifact_digest {
                warn!(transition = %transition_id, stage = %record.stage_id, "rollback snapshot digest mismatch");
                return Err(LedgerError::DigestMismatch {
                    stage_id: record.stage_id,
                    stored: record.artifact_digest.clone(),
                    recomputed,
                });
            }
        }
        Ok(sealed.records)
    }
}
