use std::collections::HashMap;
use std::sync::Arc;

use gsep_types::{AgentId, PhaseType, StageId, TransitionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Typed dispatch key for agent capabilities.
///
/// Phase configuration names methods as strings; they are resolved to one
/// of these variants once, at orchestrator construction, so no name-based
/// lookup ever happens at call time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMethod {
    LockAnchor,
    RunVetting,
    ExecuteMutation,
    AuditComparison,
    AtomicCalculus,
    FinalizeCommitment,
}

impl AgentMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lock_anchor" => Some(Self::LockAnchor),
            "run_vetting" => Some(Self::RunVetting),
            "execute_mutation" => Some(Self::ExecuteMutation),
            "audit_comparison" => Some(Self::AuditComparison),
            "atomic_calculus" => Some(Self::AtomicCalculus),
            "finalize_commitment" => Some(Self::FinalizeCommitment),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LockAnchor => "lock_anchor",
            Self::RunVetting => "run_vetting",
            Self::ExecuteMutation => "execute_mutation",
            Self::AuditComparison => "audit_comparison",
            Self::AtomicCalculus => "atomic_calculus",
            Self::FinalizeCommitment => "finalize_commitment",
        }
    }
}

impl std::fmt::Display for AgentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Execution context handed to every agent invocation.
#[derive(Clone, Debug)]
pub struct PhaseContext {
    pub transition_id: TransitionId,
    pub stage: StageId,
    pub phase_type: PhaseType,
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent method failed: {0}")]
    Failed(String),
}

/// Capability interface implemented by external governance agents.
///
/// Agents declare which methods they support; the orchestrator validates
/// every configured binding against this before execution starts.
pub trait GovernanceAgent: Send + Sync {
    fn supports(&self, method: AgentMethod) -> bool;
    fn invoke(&self, method: AgentMethod, ctx: &PhaseContext) -> Result<Value, AgentError>;
}

/// Externally supplied agent bindings, keyed by agent id.
#[derive(Clone, Default)]
pub struct AgentTable {
    agents: HashMap<AgentId, Arc<dyn GovernanceAgent>>,
}

impl AgentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: AgentId, agent: Arc<dyn GovernanceAgent>) {
        self.agents.insert(id, agent);
    }

    pub fn resolve(&self, id: &AgentId) -> Option<Arc<dyn GovernanceAgent>> {
        self.agents.get(id).cloned()
    }
}
