use thiserror::Error;

/// Errors raised before any execution starts. Never retried; the
/// orchestrator refuses to construct.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Configuration(String),
}
