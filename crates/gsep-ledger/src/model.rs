use chrono::{DateTime, Utc};
use gsep_types::{FinalStatus, LedgerId, StageArtifactRecord, TransitionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One fully persisted transition ledger: all stage artifact records plus
/// the final status and receipt, sealed as a single durable unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SealedLedger {
    pub ledger_id: LedgerId,
    pub transition_id: TransitionId,
    pub final_status: FinalStatus,
    pub receipt: Value,
    pub records: Vec<StageArtifactRecord>,
    pub sealed_at: DateTime<Utc>,
}
