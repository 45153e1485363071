use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stage::StageId;

/// One TEDS event — a structured, sequence-numbered notification emitted
/// per stage transition for sentinel auditing.
///
/// `sequence_id` is strictly monotonic: the sentinel accepts event N only
/// if it is the N-th event of the stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TedsEvent {
    pub sequence_id: u64,
    pub stage: StageId,
    pub payload: Value,
}

impl TedsEvent {
    pub fn new(sequence_id: u64, stage: StageId, payload: Value) -> Self {
        Self {
            sequence_id,
            stage,
            payload,
        }
    }

    /// The `flag_active` marker reported by upstream agents, if any.
    pub fn active_flag(&self) -> Option<&str> {
        self.payload.get("flag_active").and_then(Value::as_str)
    }
}
