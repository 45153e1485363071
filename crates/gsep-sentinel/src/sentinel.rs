use std::sync::{Arc, RwLock};

use gsep_types::{ContractDefinition, HaltReason, HaltReport, StageId, TedsEvent};
use tracing::{debug, warn};

use crate::halt::HaltChannel;

struct StreamState {
    expected_sequence_id: u64,
    last_stage: Option<StageId>,
}

/// Audits each TEDS event against the contract and the critical-flag
/// axioms, halting the transition on the first violation.
///
/// Auditors run in fixed order, fail-fast: sequencing, mandatory keys,
/// declared field types, critical flags. The contract is read-only for the
/// sentinel's lifetime.
pub struct IntegritySentinel {
    contract: ContractDefinition,
    channel: Arc<HaltChannel>,
    state: RwLock<StreamState>,
}

impl IntegritySentinel {
    pub fn new(contract: ContractDefinition, channel: Arc<HaltChannel>) -> Self {
        Self {
            contract,
            channel,
            state: RwLock::new(StreamState {
                expected_sequence_id: 0,
                last_stage: None,
            }),
        }
    }

    /// Whether the halt latch is set. The orchestrator consults this at
    /// every stage boundary before doing any further work.
    pub fn halted(&self) -> bool {
        self.channel.halted()
    }

    /// Ingest one event. Returns `true` if the stream is halted (either by
    /// this event or previously); `false` means the event was accepted and
    /// the sequence counter advanced.
    pub fn monitor_stream(&self, event: &TedsEvent) -> bool {
        if self.channel.halted() {
            return true;
        }

        let mut state = match self.state.write() {
            Ok(state) => state,
            // Fail closed on a poisoned stream state.
            Err(_) => return true,
        };

        if let Some(violation) = self.audit(&state, event) {
            warn!(
                stage = %event.stage,
                sequence = event.sequence_id,
                class = violation.class(),
                "TEDS contract violation"
            );
            let report = HaltReport::new(self.channel.transition_id(), violation)
                .at_stage(event.stage)
                .at_sequence(event.sequence_id);
            self.channel.fire(report);
            return true;
        }

        state.expected_sequence_id += 1;
        state.last_stage = Some(event.stage);
        debug!(stage = %event.stage, sequence = event.sequence_id, "TEDS event accepted");
        false
    }

    /// Run the composed auditors in fixed order; first failure wins.
    fn audit(&self, state: &StreamState, event: &TedsEvent) -> Option<HaltReason> {
        self.audit_sequence(state, event)
            .or_else(|| self.audit_mandatory_keys(event))
            .or_else(|| self.audit_field_types(event))
            .or_else(|| self.audit_critical_flags(event))
    }

    fn audit_sequence(&self, state: &StreamState, event: &TedsEvent) -> Option<HaltReason> {
        if event.sequence_id != state.expected_sequence_id {
            return Some(HaltReason::SequenceBreach {
                expected: state.expected_sequence_id,
                found: event.sequence_id,
                detail: "non-monotonic sequence id".into(),
            });
        }
        if let Some(last) = state.last_stage {
            if event.stage <= last {
                return Some(HaltReason::SequenceBreach {
                    expected: state.expected_sequence_id,
                    found: event.sequence_id,
                    detail: format!("stage {} does not advance past {}", event.stage, last),
                });
            }
        }
        None
    }

    fn audit_mandatory_keys(&self, event: &TedsEvent) -> Option<HaltReason> {
        let payload = match event.payload.as_object() {
            Some(map) => map,
            None => {
                return Some(HaltReason::SchemaViolation {
                    missing_keys: self.contract.mandatory_keys.iter().cloned().collect(),
                })
            }
        };
        let missing: Vec<String> = self
            .contract
            .mandatory_keys
            .iter()
            .filter(|key| !payload.contains_key(*key))
            .cloned()
            .collect();
        if missing.is_empty() {
            None
        } else {
            Some(HaltReason::SchemaViolation {
                missing_keys: missing,
            })
        }
    }

    fn audit_field_types(&self, event: &TedsEvent) -> Option<HaltReason> {
        let payload = event.payload.as_object()?;
        for (field, spec) in &self.contract.fields {
            if let Some(value) = payload.get(field) {
                if !spec.field_type.matches(value) {
                    return Some(HaltReason::TypeViolation {
                        field: field.clone(),
                        expected: spec.field_type.name().to_string(),
                    });
                }
            }
        }
        None
    }

    fn audit_critical_flags(&self, event: &TedsEvent) -> Option<HaltReason> {
        let flag = event.active_flag()?;
        if self.contract.is_critical_flag(flag) {
            return Some(HaltReason::AxiomaticViolation {
                flag: flag.to_string(),
            });
        }
        None
    }
}
