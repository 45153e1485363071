use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TransitionId;
use crate::stage::StageId;

/// Structured, machine-readable reason for an Integrity Halt.
///
/// Every failure class of the pipeline maps to exactly one variant, so
/// audit tooling can distinguish outcomes without parsing log text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HaltReason {
    /// A mandatory contract key was absent from an event payload.
    SchemaViolation { missing_keys: Vec<String> },
    /// A declared contract field carried a value of the wrong type.
    TypeViolation { field: String, expected: String },
    /// An agent reported a critical flag; unconditional halt.
    AxiomaticViolation { flag: String },
    /// Event stream sequencing broke monotonicity.
    SequenceBreach {
        expected: u64,
        found: u64,
        detail: String,
    },
    /// A halt flag was already latched at a stage boundary.
    IntegrityBreach { detail: String },
    /// An atomic validation phase did not return boolean `true`.
    ValidationFailure { detail: String },
    /// An agent invocation failed outright.
    AgentFailure { detail: String },
    /// Stage-chain authorization or conflict fault.
    ChainFault { detail: String },
    /// Forensic ledger serialization or persistence fault.
    LedgerFault { detail: String },
}

impl HaltReason {
    /// Stable class label, one per failure class.
    pub fn class(&self) -> &'static str {
        match self {
            HaltReason::SchemaViolation { .. } => "schema_violation",
            HaltReason::TypeViolation { .. } => "type_violation",
            HaltReason::AxiomaticViolation { .. } => "axiomatic_violation",
            HaltReason::SequenceBreach { .. } => "sequence_breach",
            HaltReason::IntegrityBreach { .. } => "integrity_breach",
            HaltReason::ValidationFailure { .. } => "validation_failure",
            HaltReason::AgentFailure { .. } => "agent_failure",
            HaltReason::ChainFault { .. } => "chain_fault",
            HaltReason::LedgerFault { .. } => "ledger_fault",
        }
    }
}

/// Full halt record handed to the halt signal and the rollback executor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HaltReport {
    pub transition_id: TransitionId,
    pub reason: HaltReason,
    /// Stage the pipeline was at when the halt fired, if known.
    pub stage: Option<StageId>,
    /// Sequence id of the offending TEDS event, if the halt came from the
    /// event stream.
    pub sequence_id: Option<u64>,
    pub raised_at: DateTime<Utc>,
}

impl HaltReport {
    pub fn new(transition_id: TransitionId, reason: HaltReason) -> Self {
        Self {
            transition_id,
            reason,
            stage: None,
            sequence_id: None,
            raised_at: Utc::now(),
        }
    }

    pub fn at_stage(mut self, stage: StageId) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn at_sequence(mut self, sequence_id: u64) -> Self {
        self.sequence_id = Some(sequence_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_classes_are_distinct() {
        let reasons = [
            HaltReason::SchemaViolation {
                missing_keys: vec![],
            },
            HaltReason::TypeViolation {
                field: "f".into(),
                expected: "string".into(),
            },
            HaltReason::AxiomaticViolation { flag: "PVLM".into() },
            HaltReason::SequenceBreach {
                expected: 1,
                found: 3,
                detail: String::new(),
            },
            HaltReason::IntegrityBreach { detail: String::new() },
            HaltReason::ValidationFailure { detail: String::new() },
            HaltReason::AgentFailure { detail: String::new() },
            HaltReason::ChainFault { detail: String::new() },
            HaltReason::LedgerFault { detail: String::new() },
        ];
        let mut classes: Vec<_> = reasons.iter().map(|r| r.class()).collect();
        classes.sort_unstable();
        classes.dedup();
        assert_eq!(classes.len(), reasons.len());
    }

    #[test]
    fn report_serializes_with_tagged_reason() {
        let report = HaltReport::new(
            TransitionId::new(),
            HaltReason::AxiomaticViolation { flag: "ADTM".into() },
        )
        .at_stage(StageId(5))
        .at_sequence(2);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["reason"]["kind"], "axiomatic_violation");
        assert_eq!(value["reason"]["flag"], "ADTM");
        assert_eq!(value["sequence_id"], 2);
    }
}
