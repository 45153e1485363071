//! GSEP-C Orchestrator - drives the mandatory, linear stage sequence of one
//! governance transition.
//!
//! Every phase runs the same discipline: advance one stage at a time with a
//! boundary flag check, invoke the resolved agent method, record the
//! artifact in the forensic ledger, commit the stage lock, and submit the
//! TEDS event to the sentinel. Any breach, fault, or failed validation
//! funnels through one halt handler; there are no retries and no partial
//! resumes — a new transition starts from the genesis stage after rollback.

#![deny(unsafe_code)]

mod agent;
mod error;
mod orchestrator;
mod outcome;
mod plan;

pub use agent::{AgentError, AgentMethod, AgentTable, GovernanceAgent, PhaseContext};
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use outcome::RunOutcome;
pub use plan::PhasePlan;
