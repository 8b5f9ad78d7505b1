// Per-slot chord candidates.
//
// A slot's candidates are the degrees whose chord contains the slot's melody
// pitch class. Octave is irrelevant here. An empty candidate set means the
// note is chromatic to the key and fails the whole run.
//
// `CandidateSet` is built here, narrowed by propagate.rs, and then read (never
// written) by search.rs.

use crate::degree::{Degree, DegreeSet};
use crate::error::HarmonizeError;
use crate::melody::Slot;
use crate::vocabulary::ChordVocabulary;
use tracing::debug;

/// Candidate degrees for each slot, indexed by slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    sets: Vec<DegreeSet>,
}

impl CandidateSet {
    pub fn from_sets(sets: Vec<DegreeSet>) -> Self {
        CandidateSet { sets }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, slot: usize) -> DegreeSet {
        self.sets[slot]
    }

    pub(crate) fn set(&mut self, slot: usize, set: DegreeSet) {
        self.sets[slot] = set;
    }

    pub fn iter(&self) -> impl Iterator<Item = DegreeSet> + '_ {
        self.sets.iter().copied()
    }
}

/// Degrees whose chord contains `pitch_class`.
pub fn degrees_containing(vocab: &ChordVocabulary, pitch_class: u8) -> DegreeSet {
    Degree::ALL
        .into_iter()
        .filter(|&d| vocab.chord(d).contains(pitch_class))
        .collect()
}

/// Compute candidates for every slot, failing on the first slot with none.
pub fn derive_candidates(slots: &[Slot], vocab: &ChordVocabulary) -> Result<CandidateSet, HarmonizeError> {
    let mut sets = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        let set = degrees_containing(vocab, slot.pitch_class());
        debug!(slot = i, pitch = slot.pitch, candidates = %set, "derived candidates");
        if set.is_empty() {
            return Err(HarmonizeError::EmptyCandidateSet {
                slot: i,
                position: slot.position,
                pitch: slot.pitch,
            });
        }
        sets.push(set);
    }
    Ok(CandidateSet { sets })
}
