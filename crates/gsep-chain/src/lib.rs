//! Stage-Chain Manager (SCM) - sole issuer and verifier of the stage locks
//! (L_N) required for sequential GSEP-C progression.
//!
//! Each lock cryptographically commits one stage's artifact to its
//! predecessor's lock, forming a minimal append-only hash chain over the
//! forensic ledger's content. Lock values are deterministic:
//! `L_N = H(root_key_digest || stage_id || artifact_digest || L_{N-1})`,
//! independent of call order and wall-clock time.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::RwLock;

use gsep_crypto::{artifact_digest, digest_hex, key_digest, LOCK_DOMAIN};
use gsep_types::{ArtifactDigest, LockValue, StageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Domain prefix for the well-known genesis anchor.
const GENESIS_DOMAIN: &[u8] = b"gsep-chain-genesis-v1";

/// The well-known anchor the first lock of every chain must chain off.
pub fn genesis_anchor() -> LockValue {
    LockValue(digest_hex(GENESIS_DOMAIN, &[]))
}

/// Lifecycle status of a stage lock.
///
/// Locks are created atomically as `Committed`; `Pending` never escapes the
/// issuance call and exists only so persisted locks can express the full
/// lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Pending,
    Committed,
}

/// One issued stage lock. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLock {
    pub stage_id: StageId,
    pub preceding_lock: LockValue,
    pub artifact_digest: ArtifactDigest,
    pub lock_value: LockValue,
    pub status: LockStatus,
}

/// Errors from stage-chain operations. All are fatal to the calling
/// transition and must reach the orchestrator's halt path.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("chain authorization failure at {stage_id}: {preceding} is not a committed lock")]
    UnauthorizedPredecessor {
        stage_id: StageId,
        preceding: LockValue,
    },

    #[error("conflicting re-issuance at {stage_id}: committed {existing}, attempted {attempted}")]
    Conflict {
        stage_id: StageId,
        existing: LockValue,
        attempted: LockValue,
    },

    #[error("artifact for {stage_id} is not canonically serializable: {detail}")]
    Serialization { stage_id: StageId, detail: String },

    #[error("chain state lock poisoned")]
    Poisoned,
}

/// One verification mismatch reported by [`StageChainManager::verify_full_chain`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainFailure {
    pub stage_id: StageId,
    pub stored: LockValue,
    pub recomputed: LockValue,
}

struct ChainState {
    /// Locks in issuance order.
    locks: Vec<StageLock>,
    by_stage: HashMap<StageId, usize>,
    /// Value of the most recently committed lock (the head).
    head: Option<LockValue>,
}

/// Issues and verifies per-stage cryptographic commitments.
///
/// Interior mutability serializes concurrent issuance so the "preceding
/// lock must be committed" invariant cannot race.
pub struct StageChainManager {
    root_key_digest: String,
    state: RwLock<ChainState>,
}

impl StageChainManager {
    /// Create a manager keyed by the given root governance key material.
    /// Only a digest of the material is retained.
    pub fn new(key_material: &str) -> Self {
        Self {
            root_key_digest: key_digest(key_material),
            state: RwLock::new(ChainState {
                locks: Vec::new(),
                by_stage: HashMap::new(),
                head: None,
            }),
        }
    }

    fn compute_lock(
        &self,
        stage_id: StageId,
        artifact: &ArtifactDigest,
        preceding: &LockValue,
    ) -> LockValue {
        LockValue(digest_hex(
            LOCK_DOMAIN,
            &[
                self.root_key_digest.as_bytes(),
                stage_id.to_string().as_bytes(),
                artifact.as_str().as_bytes(),
                preceding.as_str().as_bytes(),
            ],
        ))
    }

    /// Issue the lock for a stage, chained off `preceding_lock`.
    ///
    /// The first lock of the chain must chain off [`genesis_anchor`]; every
    /// later lock must chain off an already-committed lock value. Re-issuing
    /// a stage with an identical resulting lock is an idempotent no-op;
    /// re-issuing with a different resulting lock is a conflict. On any
    /// error nothing is recorded.
    pub fn issue_lock(
        &self,
        stage_id: StageId,
        preceding_lock: &LockValue,
        artifact: &Value,
    ) -> Result<LockValue, ChainError> {
        let digest = artifact_digest(artifact).map_err(|e| ChainError::Serialization {
            stage_id,
            detail: e.to_string(),
        })?;
        let candidate = self.compute_lock(stage_id, &digest, preceding_lock);

        let mut state = self.state.write().map_err(|_| ChainError::Poisoned)?;

        if let Some(&idx) = state.by_stage.get(&stage_id) {
            let existing = &state.locks[idx];
            if existing.lock_value == candidate {
                debug!(stage = %stage_id, "idempotent lock re-issuance");
                return Ok(candidate);
            }
            warn!(stage = %stage_id, "conflicting lock re-issuance rejected");
            return Err(ChainError::Conflict {
                stage_id,
                existing: existing.lock_value.clone(),
                attempted: candidate,
            });
        }

        let authorized = match &state.head {
            // Empty chain: only the genesis anchor is a valid predecessor.
            None => *preceding_lock == genesis_anchor(),
            Some(_) => state
                .locks
                .iter()
                .any(|l| l.status == LockStatus::Committed && l.lock_value == *preceding_lock),
        };
        if !authorized {
            return Err(ChainError::UnauthorizedPredecessor {
                stage_id,
                preceding: preceding_lock.clone(),
            });
        }

        // Created atomically as committed; no partial state is observable.
        let lock = StageLock {
            stage_id,
            preceding_lock: preceding_lock.clone(),
            artifact_digest: digest,
            lock_value: candidate.clone(),
            status: LockStatus::Committed,
        };
        debug!(stage = %stage_id, lock = %candidate, "stage lock committed");
        let idx = state.locks.len();
        state.by_stage.insert(stage_id, idx);
        state.locks.push(lock);
        state.head = Some(candidate.clone());

        Ok(candidate)
    }

    /// Value of the most recently committed lock.
    pub fn head(&self) -> Option<LockValue> {
        self.state.read().ok().and_then(|s| s.head.clone())
    }

    /// The committed lock for a stage, if one exists.
    pub fn lock_for_stage(&self, stage_id: StageId) -> Option<StageLock> {
        let state = self.state.read().ok()?;
        state
            .by_stage
            .get(&stage_id)
            .map(|&idx| state.locks[idx].clone())
    }

    /// Verify the entire chain.
    ///
    /// Walks backward from the head via `preceding_lock` pointers to
    /// reconstruct the sequence, then recomputes every lock from its
    /// recorded artifact digest and predecessor. Returns one failure per
    /// stored lock that does not equal its recomputation; an empty list
    /// means the chain is internally consistent. A poisoned state lock is
    /// an error, never a clean verification.
    pub fn verify_full_chain(&self) -> Result<Vec<ChainFailure>, ChainError> {
        let state = self.state.read().map_err(|_| ChainError::Poisoned)?;

        // A mutated preceding_lock breaks the backward walk before genesis;
        // fall back to issuance order so the tampered stage is still the
        // one recomputed and reported.
        let walked = self.walk_back(&state);
        let ordered: Vec<&StageLock> = if walked.len() == state.locks.len() {
            walked.into_iter().rev().collect()
        } else {
            state.locks.iter().collect()
        };

        let mut failures = Vec::new();
        for lock in ordered {
            let expected =
                self.compute_lock(lock.stage_id, &lock.artifact_digest, &lock.preceding_lock);
            if expected != lock.lock_value {
                warn!(stage = %lock.stage_id, "chain verification mismatch");
                failures.push(ChainFailure {
                    stage_id: lock.stage_id,
                    stored: lock.lock_value.clone(),
                    recomputed: expected,
                });
            }
        }
        Ok(failures)
    }

    /// Reconstruct head-to-genesis order by following predecessor pointers.
    fn walk_back<'a>(&self, state: &'a ChainState) -> Vec<&'a StageLock> {
        let by_value: HashMap<&LockValue, &StageLock> =
            state.locks.iter().map(|l| (&l.lock_value, l)).collect();
        let mut sequence = Vec::with_capacity(state.locks.len());
        let anchor = genesis_anchor();

        let mut cursor = state.head.as_ref().and_then(|h| by_value.get(h).copied());
        while let Some(lock) = cursor {
            sequence.push(lock);
            if lock.preceding_lock == anchor || sequence.len() > state.locks.len() {
                break;
            }
            cursor = by_value.get(&lock.preceding_lock).copied();
        }
        sequence
    }

    #[cfg(test)]
    fn tamper<F: FnOnce(&mut StageLock)>(&self, stage_id: StageId, mutate: F) {
        let mut state = self.state.write().unwrap();
        let idx = state.by_stage[&stage_id];
        mutate(&mut state.locks[idx]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain_of(n: u16) -> (StageChainManager, Vec<LockValue>) {
        let scm = StageChainManager::new("root-governance-key");
        let mut locks = Vec::new();
        let mut preceding = genesis_anchor();
        for i in 1..=n {
            let lock = scm
                .issue_lock(StageId(i), &preceding, &json!({"stage": i}))
                .unwrap();
            locks.push(lock.clone());
            preceding = lock;
        }
        (scm, locks)
    }

    #[test]
    fn lock_issuance_is_deterministic() {
        let artifact = json!({"x": 1, "y": [2, 3]});
        let a = StageChainManager::new("key")
            .issue_lock(StageId(1), &genesis_anchor(), &artifact)
            .unwrap();
        let b = StageChainManager::new("key")
            .issue_lock(StageId(1), &genesis_anchor(), &artifact)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_produce_different_locks() {
        let artifact = json!({"x": 1});
        let a = StageChainManager::new("key-a")
            .issue_lock(StageId(1), &genesis_anchor(), &artifact)
            .unwrap();
        let b = StageChainManager::new("key-b")
            .issue_lock(StageId(1), &genesis_anchor(), &artifact)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn consistent_chain_verifies_empty() {
        let (scm, _) = chain_of(5);
        assert!(scm.verify_full_chain().unwrap().is_empty());
    }

    #[test]
    fn unauthorized_predecessor_is_rejected_and_not_recorded() {
        let (scm, _) = chain_of(2);
        let bogus = LockValue("deadbeef".repeat(8));
        let err = scm
            .issue_lock(StageId(3), &bogus, &json!({"stage": 3}))
            .unwrap_err();
        assert!(matches!(err, ChainError::UnauthorizedPredecessor { stage_id, .. } if stage_id == StageId(3)));
        assert!(scm.lock_for_stage(StageId(3)).is_none());
    }

    #[test]
    fn genesis_anchor_rejected_once_chain_is_nonempty() {
        let (scm, _) = chain_of(1);
        let err = scm
            .issue_lock(StageId(2), &genesis_anchor(), &json!({"stage": 2}))
            .unwrap_err();
        assert!(matches!(err, ChainError::UnauthorizedPredecessor { .. }));
    }

    #[test]
    fn reissuance_is_idempotent() {
        let (scm, locks) = chain_of(2);
        let again = scm
            .issue_lock(StageId(2), &locks[0], &json!({"stage": 2u16}))
            .unwrap();
        assert_eq!(again, locks[1]);
        assert!(scm.verify_full_chain().unwrap().is_empty());
    }

    #[test]
    fn conflicting_reissuance_is_rejected() {
        let (scm, locks) = chain_of(2);
        let err = scm
            .issue_lock(StageId(2), &locks[0], &json!({"stage": "tampered"}))
            .unwrap_err();
        match err {
            ChainError::Conflict {
                stage_id, existing, ..
            } => {
                assert_eq!(stage_id, StageId(2));
                assert_eq!(existing, locks[1]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn tampered_artifact_digest_reports_exactly_that_stage() {
        let (scm, _) = chain_of(4);
        scm.tamper(StageId(3), |lock| {
            lock.artifact_digest = ArtifactDigest("0".repeat(64));
        });
        let failures = scm.verify_full_chain().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage_id, StageId(3));
        assert_ne!(failures[0].stored, failures[0].recomputed);
    }

    #[test]
    fn tampered_preceding_lock_reports_exactly_that_stage() {
        let (scm, _) = chain_of(4);
        scm.tamper(StageId(2), |lock| {
            lock.preceding_lock = LockValue("f".repeat(64));
        });
        let failures = scm.verify_full_chain().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage_id, StageId(2));
    }

    #[test]
    fn head_tracks_most_recent_commit() {
        let (scm, locks) = chain_of(3);
        assert_eq!(scm.head(), Some(locks[2].clone()));
    }

    #[test]
    fn poisoned_state_is_an_error_not_a_clean_verification() {
        let (scm, _) = chain_of(2);
        let scm = std::sync::Arc::new(scm);
        let poisoner = std::sync::Arc::clone(&scm);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.state.write().unwrap();
            panic!("poison the chain state");
        })
        .join();
        assert!(result.is_err());
        assert!(matches!(scm.verify_full_chain(), Err(ChainError::Poisoned)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn issuance_deterministic_for_arbitrary_artifacts(
                stage in 1u16..32,
                keys in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6),
            ) {
                let artifact = serde_json::to_value(&keys).unwrap();
                let a = StageChainManager::new("prop-key")
                    .issue_lock(StageId(stage), &genesis_anchor(), &artifact)
                    .unwrap();
                let b = StageChainManager::new("prop-key")
                    .issue_lock(StageId(stage), &genesis_anchor(), &artifact)
                    .unwrap();
                prop_assert_eq!(a, b);
            }

            #[test]
            fn chains_verify_empty_for_any_length(n in 1u16..24) {
                let (scm, _) = chain_of(n);
                prop_assert!(scm.verify_full_chain().unwrap().is_empty());
            }
        }
    }
}
