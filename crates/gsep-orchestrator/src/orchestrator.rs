use std::sync::Arc;

use gsep_chain::{genesis_anchor, StageChainManager};
use gsep_ledger::ForensicLedger;
use gsep_sentinel::{EvidenceSealer, HaltChannel, IntegritySentinel};
use gsep_types::{
    FinalStatus, HaltReason, HaltReport, LockValue, PhaseSpec, PhaseType, StageId, TedsEvent,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::agent::{AgentMethod, AgentTable, GovernanceAgent, PhaseContext};
use crate::error::OrchestratorError;
use crate::outcome::RunOutcome;
use crate::plan::PhasePlan;

/// One phase with its agent binding resolved and validated.
#[derive(Clone)]
struct ResolvedPhase {
    spec: PhaseSpec,
    agent: Arc<dyn GovernanceAgent>,
    method: AgentMethod,
}

/// Seals the transition's ledger with `Halted` status when the halt latch
/// fires, before the rollback executor is invoked. The executor then pulls
/// a durable, digest-verified snapshot via `retrieve_rollback_state`.
struct HaltEvidenceSealer {
    ledger: Arc<ForensicLedger>,
}

impl EvidenceSealer for HaltEvidenceSealer {
    fn seal(&self, report: &HaltReport) {
        let receipt = json!({
            "halt_class": report.reason.class(),
            "stage": report.stage.map(|s| s.to_string()).unwrap_or_default(),
        });
        if let Err(e) =
            self.ledger
                .finalize_transition(report.transition_id, FinalStatus::Halted, receipt)
        {
            warn!(transition = %report.transition_id, error = %e, "failed to seal halted-transition evidence");
        }
    }
}

/// Drives one GSEP-C transition through its fixed stage sequence.
///
/// Single-shot: `run` consumes the orchestrator. Once the halt latch fires
/// the transition is terminal; a retry is a brand-new transition.
pub struct Orchestrator {
    phases: Vec<ResolvedPhase>,
    chain: Arc<StageChainManager>,
    ledger: Arc<ForensicLedger>,
    sentinel: Arc<IntegritySentinel>,
    channel: Arc<HaltChannel>,
    current_stage: StageId,
    sequence_id: u64,
}

impl Orchestrator {
    /// Build an orchestrator, resolving and validating every phase's agent
    /// binding up front. Missing agents, unknown method names, and
    /// unsupported methods are configuration errors — fatal before any
    /// execution starts.
    pub fn new(
        plan: PhasePlan,
        agents: &AgentTable,
        chain: Arc<StageChainManager>,
        ledger: Arc<ForensicLedger>,
        sentinel: Arc<IntegritySentinel>,
        channel: Arc<HaltChannel>,
    ) -> Result<Self, OrchestratorError> {
        let mut phases = Vec::with_capacity(plan.phases().len());
        for spec in plan.phases() {
            let agent = agents.resolve(&spec.agent).ok_or_else(|| {
                OrchestratorError::Configuration(format!("no agent bound for '{}'", spec.agent))
            })?;
            let method = AgentMethod::from_name(&spec.method).ok_or_else(|| {
                OrchestratorError::Configuration(format!("unknown method '{}'", spec.method))
            })?;
            if !agent.supports(method) {
                return Err(OrchestratorError::Configuration(format!(
                    "agent '{}' does not support method '{}'",
                    spec.agent, method
                )));
            }
            phases.push(ResolvedPhase {
                spec: spec.clone(),
                agent,
                method,
            });
        }

        // The latch seals the forensic evidence before it invokes the
        // rollback executor, wherever the halt originates.
        channel.set_sealer(Arc::new(HaltEvidenceSealer {
            ledger: ledger.clone(),
        }));

        Ok(Self {
            phases,
            chain,
            ledger,
            sentinel,
            channel,
            current_stage: StageId::GENESIS,
            sequence_id: 0,
        })
    }

    /// Execute the transition end to end.
    pub fn run(mut self) -> RunOutcome {
        let transition_id = self.channel.transition_id();
        info!(transition = %transition_id, "S00: GSEP-C transition started");

        let mut preceding_lock = genesis_anchor();
        for phase in self.phases.clone() {
            // 1. Progress: one stage at a time, checking the halt latch at
            //    every boundary before any further work.
            if let Err(reason) = self.progress_to_stage(phase.spec.target_stage) {
                return self.halt(reason);
            }

            // 2-3. Resolve happened at construction; execute the method.
            let ctx = PhaseContext {
                transition_id,
                stage: self.current_stage,
                phase_type: phase.spec.phase_type,
            };
            let artifact = match phase.agent.invoke(phase.method, &ctx) {
                Ok(artifact) => artifact,
                Err(e) => {
                    return self.halt(HaltReason::AgentFailure {
                        detail: format!("{} at {}: {e}", phase.method, self.current_stage),
                    })
                }
            };

            // Record the artifact before committing its lock: the ledger
            // entry is the preimage the lock attests to.
            let digest = match self.ledger.stage_artifact(
                transition_id,
                self.current_stage,
                &phase.spec.agent,
                phase.method.name(),
                &artifact,
            ) {
                Ok(digest) => digest,
                Err(e) => {
                    return self.halt(HaltReason::LedgerFault {
                        detail: e.to_string(),
                    })
                }
            };

            let lock = match self
                .chain
                .issue_lock(self.current_stage, &preceding_lock, &artifact)
            {
                Ok(lock) => lock,
                Err(e) => {
                    return self.halt(HaltReason::ChainFault {
                        detail: e.to_string(),
                    })
                }
            };

            // Emit the TEDS event; the sentinel audits it synchronously.
            let event = self.build_event(&phase, &digest.0, &lock, &artifact);
            if self.sentinel.monitor_stream(&event) {
                return self.halt(HaltReason::IntegrityBreach {
                    detail: format!("TEDS stream rejected event for {}", self.current_stage),
                });
            }
            self.sequence_id += 1;

            // 4. Atomic validation phases demand a boolean true result.
            if phase.spec.phase_type == PhaseType::AtomicValidation && artifact != Value::Bool(true)
            {
                return self.halt(HaltReason::ValidationFailure {
                    detail: format!("atomic check at {} returned {artifact}", self.current_stage),
                });
            }

            // Post-execution boundary check.
            if self.sentinel.halted() {
                return self.halt(HaltReason::IntegrityBreach {
                    detail: format!("halt flag latched after {}", self.current_stage),
                });
            }

            debug!(stage = %self.current_stage, lock = %lock, "phase complete");
            preceding_lock = lock;

            if phase.spec.phase_type == PhaseType::Commit {
                return self.commit(preceding_lock);
            }
        }

        // Unreachable for a validated plan: the terminal phase is COMMIT.
        self.halt(HaltReason::ValidationFailure {
            detail: "phase plan ended without a commit".into(),
        })
    }

    /// Advance `current_stage` one unit at a time up to `target`, checking
    /// the integrity flag state at every intermediate boundary.
    fn progress_to_stage(&mut self, target: StageId) -> Result<(), HaltReason> {
        if target <= self.current_stage {
            return Err(HaltReason::SequenceBreach {
                expected: u64::from(self.current_stage.0) + 1,
                found: u64::from(target.0),
                detail: format!(
                    "target {} does not advance past {}",
                    target, self.current_stage
                ),
            });
        }
        while self.current_stage < target {
            self.current_stage = self.current_stage.next();
            if self.sentinel.halted() {
                return Err(HaltReason::IntegrityBreach {
                    detail: format!("halt flag present at {} boundary", self.current_stage),
                });
            }
        }
        Ok(())
    }

    fn build_event(
        &self,
        phase: &ResolvedPhase,
        digest: &str,
        lock: &LockValue,
        artifact: &Value,
    ) -> TedsEvent {
        let mut payload = json!({
            "stage": self.current_stage.to_string(),
            "agent": phase.spec.agent.0,
            "artifact_digest": digest,
            "lock_value": lock.0,
        });
        // Upstream agents report critical conditions through the artifact;
        // surface them to the sentinel.
        if let Some(flag) = artifact.get("flag_active").and_then(Value::as_str) {
            payload["flag_active"] = Value::String(flag.to_string());
        }
        TedsEvent::new(self.sequence_id, self.current_stage, payload)
    }

    /// Terminal commit: verify the whole chain, then seal the ledger.
    fn commit(self, final_lock: LockValue) -> RunOutcome {
        let failures = match self.chain.verify_full_chain() {
            Ok(failures) => failures,
            Err(e) => {
                return self.halt(HaltReason::ChainFault {
                    detail: e.to_string(),
                })
            }
        };
        if !failures.is_empty() {
            return self.halt(HaltReason::ChainFault {
                detail: format!("chain verification reported {} mismatch(es)", failures.len()),
            });
        }

        let transition_id = self.channel.transition_id();
        let receipt = json!({
            "final_lock": final_lock.0,
            "terminal_stage": self.current_stage.to_string(),
        });
        match self
            .ledger
            .finalize_transition(transition_id, FinalStatus::Committed, receipt)
        {
            Ok(ledger_id) => {
                info!(
                    transition = %transition_id,
                    ledger = %ledger_id,
                    "transition committed; state transition receipt generated"
                );
                RunOutcome::Committed {
                    ledger_id,
                    final_lock,
                }
            }
            Err(e) => self.halt(HaltReason::LedgerFault {
                detail: e.to_string(),
            }),
        }
    }

    /// Centralized halt funnel: fire the halt latch (evidence sealing,
    /// logging, halt signal, rollback — first fire only) and return the
    /// halted outcome. Never retries, never exits the process.
    fn halt(&self, reason: HaltReason) -> RunOutcome {
        let transition_id = self.channel.transition_id();
        warn!(
            transition = %transition_id,
            stage = %self.current_stage,
            class = reason.class(),
            "GSEP-C failure; initiating integrity halt"
        );

        let report =
            HaltReport::new(transition_id, reason).at_stage(self.current_stage);
        self.channel.fire(report.clone());

        // If the sentinel latched first, its report is the authoritative one.
        let report = self.channel.last_report().unwrap_or(report);
        RunOutcome::Halted { report }
    }
}
