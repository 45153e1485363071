use gsep_types::{ArtifactDigest, StageId, TransitionId};
use thiserror::Error;

/// Errors from forensic ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("artifact is not canonically serializable: {0}")]
    Serialization(String),

    /// Persistence failed. The transition must not be treated as finalized;
    /// the in-memory ledger is left intact.
    #[error("ledger persistence failed: {0}")]
    Persistence(String),

    #[error("transition {0} is already sealed")]
    AlreadySealed(TransitionId),

    #[error("no sealed ledger for transition {0}")]
    UnknownTransition(TransitionId),

    /// A sealed record's stored digest does not match its raw artifact.
    /// The entire rollback snapshot is untrusted.
    #[error("digest mismatch at {stage_id}: stored {stored}, recomputed {recomputed}")]
    DigestMismatch {
        stage_id: StageId,
        stored: ArtifactDigest,
        recomputed: ArtifactDigest,
    },

    #[error("ledger state lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::Persistence(e.to_string())
    }
}
