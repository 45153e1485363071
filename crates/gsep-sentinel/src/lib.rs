//! Integrity Sentinel (IS) - actively monitors the TEDS event stream for
//! contract deviations and critical flags, and triggers the unconditional
//! Integrity Halt on any violation.
//!
//! The halt is an absorbing latch: once fired, the transition is terminal.
//! Both the sentinel and the orchestrator funnel their failures through the
//! shared [`HaltChannel`], which guarantees the halt signal and the rollback
//! executor are each invoked exactly once per transition.

#![deny(unsafe_code)]

mod halt;
mod sentinel;

pub use halt::{EvidenceSealer, HaltChannel, HaltSignal, RollbackExecutor};
pub use sentinel::IntegritySentinel;
