use serde::{Deserialize, Serialize};

/// One stage of the fixed GSEP-C sequence, `S00` through the terminal stage.
///
/// Stages are totally ordered; the pipeline only ever moves forward one
/// stage at a time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct StageId(pub u16);

impl StageId {
    /// The genesis stage — where every transition starts.
    pub const GENESIS: StageId = StageId(0);

    /// Terminal stage of the standard 15-stage pipeline (S00–S14).
    pub const DEFAULT_TERMINAL: StageId = StageId(14);

    pub fn next(self) -> StageId {
        StageId(self.0 + 1)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{:02}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display_is_zero_padded() {
        assert_eq!(StageId(3).to_string(), "S03");
        assert_eq!(StageId(14).to_string(), "S14");
    }

    #[test]
    fn stages_are_ordered() {
        assert!(StageId::GENESIS < StageId(1));
        assert!(StageId(1).next() > StageId(1));
    }
}
