use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AgentId, ArtifactDigest, TransitionId};
use crate::stage::StageId;

/// Final outcome recorded when a transition's forensic ledger is sealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Committed,
    Halted,
}

/// One artifact produced during a stage transition, as recorded by the
/// forensic ledger. The stored digest is the commitment preimage check:
/// rollback retrieval recomputes it from `raw_artifact` before the record
/// is trusted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageArtifactRecord {
    pub transition_id: TransitionId,
    pub stage_id: StageId,
    pub agent_id: AgentId,
    pub artifact_name: String,
    pub artifact_digest: ArtifactDigest,
    pub raw_artifact: Value,
    pub recorded_at: DateTime<Utc>,
}

impl std::fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalStatus::Committed => write!(f, "committed"),
            FinalStatus::Halted => write!(f, "halted"),
        }
    }
}
