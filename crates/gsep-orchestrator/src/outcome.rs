use gsep_types::{HaltReport, LedgerId, LockValue};

/// Terminal result of one transition run.
///
/// The orchestrator never exits the process; the embedding caller decides
/// what a halt means for it.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    /// All phases completed; the forensic ledger is sealed and the chain
    /// head is the final lock.
    Committed {
        ledger_id: LedgerId,
        final_lock: LockValue,
    },
    /// The transition halted. Rollback has been invoked; resuming requires
    /// a brand-new transition from the genesis stage.
    Halted { report: HaltReport },
}

impl RunOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, RunOutcome::Committed { .. })
    }
}
