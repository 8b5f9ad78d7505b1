// Harmonization failure kinds.
//
// Every error is terminal for the current run: the input is deterministic,
// so nothing is retried and no partial harmonization is produced. Variants
// carry the slot index (0-based, over harmonized slots) and where useful
// the melody position (index into the full melody) they refer to.

use std::fmt;

/// Which end of the progression a tonic boundary rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    First,
    Last,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::First => write!(f, "first"),
            Boundary::Last => write!(f, "last"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HarmonizeError {
    #[error("Mode '{0}' not supported (expected major or minor)")]
    UnsupportedMode(String),

    #[error("Only {found} harmonizable slots, need at least 3")]
    InsufficientSlots { found: usize },

    #[error("No diatonic chord contains melody pitch {pitch} at slot {slot} (melody position {position})")]
    EmptyCandidateSet { slot: usize, position: usize, pitch: u8 },

    #[error("There must be I in {boundary} position (slot {slot})")]
    MissingTonicBoundary { slot: usize, boundary: Boundary },

    #[error("There must be V in penultimate position (slot {slot})")]
    MissingDominantCadence { slot: usize },

    #[error("No valid progression over {slots} slots")]
    NoValidProgression { slots: usize },

    #[error("Search exceeded its budget of {budget}")]
    SearchBudgetExceeded { budget: u64 },
}

impl HarmonizeError {
    /// Stable reason code for reporting to callers outside the crate.
    pub fn code(&self) -> &'static str {
        match self {
            HarmonizeError::UnsupportedMode(_) => "UnsupportedMode",
            HarmonizeError::InsufficientSlots { .. } => "InsufficientSlots",
            HarmonizeError::EmptyCandidateSet { .. } => "EmptyCandidateSet",
            HarmonizeError::MissingTonicBoundary { .. } => "MissingTonicBoundary",
            HarmonizeError::MissingDominantCadence { .. } => "MissingDominantCadence",
            HarmonizeError::NoValidProgression { .. } => "NoValidProgression",
            HarmonizeError::SearchBudgetExceeded { .. } => "SearchBudgetExceeded",
        }
    }

    /// The harmonized slot the error points at, when there is one.
    pub fn slot(&self) -> Option<usize> {
        match self {
            HarmonizeError::EmptyCandidateSet { slot, .. }
            | HarmonizeError::MissingTonicBoundary { slot, .. }
            | HarmonizeError::MissingDominantCadence { slot } => Some(*slot),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_slot() {
        let err = HarmonizeError::MissingTonicBoundary {
            slot: 0,
            boundary: Boundary::First,
        };
        assert_eq!(err.to_string(), "There must be I in first position (slot 0)");
        assert_eq!(err.slot(), Some(0));
        assert_eq!(err.code(), "MissingTonicBoundary");
    }

    #[test]
    fn test_slotless_errors() {
        let err = HarmonizeError::InsufficientSlots { found: 2 };
        assert_eq!(err.slot(), None);
        assert_eq!(err.code(), "InsufficientSlots");
    }
}
