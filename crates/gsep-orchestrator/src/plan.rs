use gsep_types::{AgentId, PhaseSpec, PhaseType, StageId};

use crate::error::OrchestratorError;

/// A validated, ordered phase configuration.
///
/// Invariants checked once, at construction:
/// - at least one phase;
/// - target stages strictly increasing, starting past the genesis stage;
/// - the final phase reaches the pipeline's terminal stage and is a
///   `COMMIT` phase.
#[derive(Clone, Debug)]
pub struct PhasePlan {
    phases: Vec<PhaseSpec>,
    terminal_stage: StageId,
}

impl PhasePlan {
    pub fn new(phases: Vec<PhaseSpec>, terminal_stage: StageId) -> Result<Self, OrchestratorError> {
        if phases.is_empty() {
            return Err(OrchestratorError::Configuration(
                "phase list is empty".into(),
            ));
        }

        let mut previous = StageId::GENESIS;
        for phase in &phases {
            if phase.target_stage <= previous {
                return Err(OrchestratorError::Configuration(format!(
                    "phase targets must be strictly increasing: {} does not advance past {}",
                    phase.target_stage, previous
                )));
            }
            previous = phase.target_stage;
        }

        let last = phases.last().expect("non-empty checked above");
        if last.target_stage != terminal_stage {
            return Err(OrchestratorError::Configuration(format!(
                "final phase targets {} but the pipeline terminates at {}",
                last.target_stage, terminal_stage
            )));
        }
        if last.phase_type != PhaseType::Commit {
            return Err(OrchestratorError::Configuration(format!(
                "terminal phase must be COMMIT, got {}",
                last.phase_type
            )));
        }

        Ok(Self {
            phases,
            terminal_stage,
        })
    }

    /// The canonical 15-stage GSEP-C pipeline (S00-S14): anchoring,
    /// vetting, execution, evaluation, atomic finality check, commitment.
    pub fn standard() -> Self {
        let phase = |target: u16, agent: &str, method: &str, phase_type: PhaseType| PhaseSpec {
            target_stage: StageId(target),
            agent: AgentId::new(agent),
            method: method.to_string(),
            phase_type,
        };
        let phases = vec![
            phase(1, "CRoT", "lock_anchor", PhaseType::Analysis),
            phase(4, "GAX", "run_vetting", PhaseType::Decision),
            phase(7, "SGS", "execute_mutation", PhaseType::Execution),
            phase(10, "GAX", "audit_comparison", PhaseType::Analysis),
            phase(11, "GAX", "atomic_calculus", PhaseType::AtomicValidation),
            phase(14, "CRoT", "finalize_commitment", PhaseType::Commit),
        ];
        Self::new(phases, StageId::DEFAULT_TERMINAL).expect("standard plan is well-formed")
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    pub fn terminal_stage(&self) -> StageId {
        self.terminal_stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(target: u16, phase_type: PhaseType) -> PhaseSpec {
        PhaseSpec {
            target_stage: StageId(target),
            agent: AgentId::new("GAX"),
            method: "run_vetting".into(),
            phase_type,
        }
    }

    #[test]
    fn standard_plan_validates() {
        let plan = PhasePlan::standard();
        assert_eq!(plan.phases().len(), 6);
        assert_eq!(plan.terminal_stage(), StageId(14));
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = PhasePlan::new(vec![], StageId(14)).unwrap_err();
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }

    #[test]
    fn non_increasing_targets_are_rejected() {
        let phases = vec![
            phase(3, PhaseType::Execution),
            phase(3, PhaseType::Commit),
        ];
        assert!(PhasePlan::new(phases, StageId(3)).is_err());

        let phases = vec![
            phase(5, PhaseType::Execution),
            phase(2, PhaseType::Commit),
        ];
        assert!(PhasePlan::new(phases, StageId(2)).is_err());
    }

    #[test]
    fn plan_must_reach_terminal_stage() {
        let phases = vec![
            phase(1, PhaseType::Execution),
            phase(9, PhaseType::Commit),
        ];
        assert!(PhasePlan::new(phases, StageId(14)).is_err());
    }

    #[test]
    fn terminal_phase_must_be_commit() {
        let phases = vec![
            phase(1, PhaseType::Execution),
            phase(14, PhaseType::Execution),
        ];
        assert!(PhasePlan::new(phases, StageId(14)).is_err());
    }
}
