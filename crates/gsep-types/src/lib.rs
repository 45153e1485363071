//! Core type definitions for the GSEP-C governance pipeline.
//!
//! This crate provides all shared GSEP-C type definitions. No business logic —
//! just types. Every GSEP-C crate depends on this crate.

#![deny(unsafe_code)]

pub mod contract;
pub mod event;
pub mod halt;
pub mod ids;
pub mod phase;
pub mod record;
pub mod stage;

// Re-export primary types at crate root for ergonomic use.
pub use contract::{ContractDefinition, FieldSpec, FieldType};
pub use event::TedsEvent;
pub use halt::{HaltReason, HaltReport};
pub use ids::{AgentId, ArtifactDigest, LedgerId, LockValue, TransitionId};
pub use phase::{PhaseSpec, PhaseType};
pub use record::{FinalStatus, StageArtifactRecord};
pub use stage::StageId;
