use serde::{Deserialize, Serialize};

use crate::ids::AgentId;
use crate::stage::StageId;

/// Classification of one configured pipeline phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseType {
    Analysis,
    Decision,
    Execution,
    /// The phase result must be boolean `true`; anything else halts the run.
    AtomicValidation,
    /// Terminal phase — seals the forensic ledger on success.
    Commit,
}

/// One entry of the ordered phase configuration.
///
/// Wire shape (spec'd configuration file):
/// `{target: int, agent: string, method: string, type: enum}`.
/// The method name is resolved to a typed dispatch variant once, at
/// orchestrator construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    #[serde(rename = "target")]
    pub target_stage: StageId,
    pub agent: AgentId,
    pub method: String,
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
}

impl std::fmt::Display for PhaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PhaseType::Analysis => "ANALYSIS",
            PhaseType::Decision => "DECISION",
            PhaseType::Execution => "EXECUTION",
            PhaseType::AtomicValidation => "ATOMIC_VALIDATION",
            PhaseType::Commit => "COMMIT",
        };
        write!(f, "{label}")
    }
}
