use std::sync::{Arc, RwLock};

use gsep_types::{HaltReport, TransitionId};
use tracing::{debug, error};

/// System-wide halt signal. Implementations stop downstream work; the core
/// never terminates the process itself — the top-level caller decides.
pub trait HaltSignal: Send + Sync {
    fn trigger(&self, report: &HaltReport);
}

/// External rollback executor, invoked synchronously when a halt fires.
///
/// Implementations pull the verified forensic snapshot for the failed
/// transition (`retrieve_rollback_state`) and reconstruct prior state from
/// it; the snapshot is theirs to fetch, not pushed by the core.
pub trait RollbackExecutor: Send + Sync {
    fn restore_state(&self, report: &HaltReport);
}

/// Seals the in-flight transition's forensic evidence.
///
/// The latch consults this before the rollback executor, so the executor
/// always finds a sealed, retrievable snapshot for the failed transition.
pub trait EvidenceSealer: Send + Sync {
    fn seal(&self, report: &HaltReport);
}

/// Absorbing halt latch for one transition.
///
/// The first fire logs a structured reason, seals the forensic evidence,
/// signals halt, and invokes the rollback executor. Every later fire is a
/// no-op, so sealing and rollback each run exactly once no matter which
/// component detects the violation first.
pub struct HaltChannel {
    transition_id: TransitionId,
    halt: Arc<dyn HaltSignal>,
    rollback: Arc<dyn RollbackExecutor>,
    sealer: RwLock<Option<Arc<dyn EvidenceSealer>>>,
    latched: RwLock<Option<HaltReport>>,
}

impl HaltChannel {
    pub fn new(
        transition_id: TransitionId,
        halt: Arc<dyn HaltSignal>,
        rollback: Arc<dyn RollbackExecutor>,
    ) -> Self {
        Self {
            transition_id,
            halt,
            rollback,
            sealer: RwLock::new(None),
            latched: RwLock::new(None),
        }
    }

    pub fn transition_id(&self) -> TransitionId {
        self.transition_id
    }

    /// Register the evidence sealer consulted on the latching fire.
    pub fn set_sealer(&self, sealer: Arc<dyn EvidenceSealer>) {
        if let Ok(mut slot) = self.sealer.write() {
            *slot = Some(sealer);
        }
    }

    /// Fire the integrity halt. Returns `true` if this call latched the
    /// channel, `false` if a halt was already in effect.
    pub fn fire(&self, report: HaltReport) -> bool {
        let mut slot = match self.latched.write() {
            Ok(slot) => slot,
            // A poisoned latch means a halt was mid-flight; stay halted.
            Err(_) => return false,
        };
        if slot.is_some() {
            debug!(class = report.reason.class(), "halt already latched; ignoring");
            return false;
        }

        error!(
            transition = %report.transition_id,
            class = report.reason.class(),
            stage = report.stage.map(|s| s.to_string()).unwrap_or_default(),
            sequence = report.sequence_id.unwrap_or_default(),
            "INTEGRITY HALT ACTIVATED"
        );
        // Evidence must be sealed before the rollback executor runs: the
        // executor pulls its snapshot from the sealed ledger.
        if let Ok(sealer) = self.sealer.read() {
            if let Some(sealer) = sealer.as_ref() {
                sealer.seal(&report);
            }
        }
        self.halt.trigger(&report);
        self.rollback.restore_state(&report);
        *slot = Some(report);
        true
    }

    /// Whether the halt latch is set. Consulted at every stage boundary.
    pub fn halted(&self) -> bool {
        self.latched.read().map(|s| s.is_some()).unwrap_or(true)
    }

    /// The report that latched the halt, for audit reads.
    pub fn last_report(&self) -> Option<HaltReport> {
        self.latched.read().ok().and_then(|s| s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsep_types::HaltReason;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl HaltSignal for Counter {
        fn trigger(&self, _report: &HaltReport) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RollbackExecutor for Counter {
        fn restore_state(&self, _report: &HaltReport) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn report(tid: TransitionId) -> HaltReport {
        HaltReport::new(
            tid,
            HaltReason::IntegrityBreach {
                detail: "flag latched".into(),
            },
        )
    }

    #[test]
    fn first_fire_latches_and_invokes_collaborators() {
        let halt = Arc::new(Counter::default());
        let rollback = Arc::new(Counter::default());
        let tid = TransitionId::new();
        let channel = HaltChannel::new(tid, halt.clone(), rollback.clone());

        assert!(!channel.halted());
        assert!(channel.fire(report(tid)));
        assert!(channel.halted());
        assert_eq!(halt.0.load(Ordering::SeqCst), 1);
        assert_eq!(rollback.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn later_fires_are_absorbed() {
        let halt = Arc::new(Counter::default());
        let rollback = Arc::new(Counter::default());
        let tid = TransitionId::new();
        let channel = HaltChannel::new(tid, halt, rollback.clone());

        assert!(channel.fire(report(tid)));
        assert!(!channel.fire(report(tid)));
        assert!(!channel.fire(report(tid)));
        // Rollback ran exactly once.
        assert_eq!(rollback.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn evidence_is_sealed_before_rollback_runs() {
        #[derive(Default)]
        struct Trace(std::sync::Mutex<Vec<&'static str>>);
        struct Sealer(Arc<Trace>);
        struct Restorer(Arc<Trace>);
        impl EvidenceSealer for Sealer {
            fn seal(&self, _report: &HaltReport) {
                self.0 .0.lock().unwrap().push("seal");
            }
        }
        impl RollbackExecutor for Restorer {
            fn restore_state(&self, _report: &HaltReport) {
                self.0 .0.lock().unwrap().push("restore");
            }
        }

        let trace = Arc::new(Trace::default());
        let tid = TransitionId::new();
        let channel = HaltChannel::new(
            tid,
            Arc::new(Counter::default()),
            Arc::new(Restorer(trace.clone())),
        );
        channel.set_sealer(Arc::new(Sealer(trace.clone())));

        assert!(channel.fire(report(tid)));
        assert!(!channel.fire(report(tid)));
        // Sealed first, restored second, neither repeated on the second fire.
        assert_eq!(*trace.0.lock().unwrap(), vec!["seal", "restore"]);
    }

    #[test]
    fn last_report_is_the_latching_one() {
        let tid = TransitionId::new();
        let channel = HaltChannel::new(
            tid,
            Arc::new(Counter::default()),
            Arc::new(Counter::default()),
        );
        channel.fire(report(tid));
        let latched = channel.last_report().unwrap();
        assert_eq!(latched.reason.class(), "integrity_breach");
    }
}
