// End-to-end harmonization pipeline.
//
// slot selection -> candidate derivation -> propagation -> search, then on
// request one progression is chosen and voiced for rendering.
//
// `Harmonizer::harmonize` returns a `Harmonization` only when at least one
// valid progression exists; every failure is a `HarmonizeError` and nothing
// partial is produced. Choosing among valid progressions is uniform random
// via the caller's RNG, so a seeded RNG gives reproducible output.

use crate::candidates::{CandidateSet, derive_candidates};
use crate::config::HarmonizerConfig;
use crate::degree::Degree;
use crate::error::HarmonizeError;
use crate::melody::{MelodyEvent, Slot, select_slots};
use crate::mode::{Key, Mode};
use crate::propagate::propagate;
use crate::search::{Progression, ProgressionSet, enumerate_progressions};
use crate::vocabulary::ChordVocabulary;
use crate::voicing::voice_chord;
use rand::Rng;
use serde::Serialize;
use tracing::info;

/// A voiced chord for one harmonized slot, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoicedSlot {
    /// Slot index.
    pub slot: usize,
    /// Index of the harmonized note in the full melody.
    pub position: usize,
    pub degree: Degree,
    /// MIDI pitches, ascending.
    pub notes: Vec<u8>,
    /// Onset in quarter notes.
    pub onset: f64,
    /// Length in quarter notes: up to the next slot, or the note's own
    /// duration for the last slot.
    pub duration: f64,
}

/// The outcome of a successful run. Only `Harmonizer::harmonize` builds one,
/// and it always holds at least one progression.
#[derive(Debug, Clone)]
pub struct Harmonization {
    key: Key,
    vocabulary: &'static ChordVocabulary,
    slots: Vec<Slot>,
    candidates: CandidateSet,
    progressions: ProgressionSet,
}

impl Harmonization {
    pub fn key(&self) -> Key {
        self.key
    }

    pub fn vocabulary(&self) -> &'static ChordVocabulary {
        self.vocabulary
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Candidates after propagation.
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Never empty.
    pub fn progressions(&self) -> &ProgressionSet {
        &self.progressions
    }

    /// Pick one valid progression uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Progression {
        let idx = rng.random_range(0..self.progressions.len());
        &self.progressions.progressions[idx]
    }

    /// Voice `progression` slot by slot.
    pub fn realize(&self, progression: &Progression) -> Vec<VoicedSlot> {
        self.slots
            .iter()
            .zip(progression.iter())
            .enumerate()
            .map(|(i, (slot, &degree))| {
                let duration = match self.slots.get(i + 1) {
                    Some(next) => next.onset - slot.onset,
                    None => slot.duration,
                };
                VoicedSlot {
                    slot: i,
                    position: slot.position,
                    degree,
                    notes: voice_chord(slot.pitch, degree, self.vocabulary.chord(degree).tones()),
                    onset: slot.onset,
                    duration,
                }
            })
            .collect()
    }
}

/// Runs the pipeline under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Harmonizer {
    config: HarmonizerConfig,
}

impl Harmonizer {
    pub fn new(config: HarmonizerConfig) -> Self {
        Harmonizer { config }
    }

    pub fn config(&self) -> &HarmonizerConfig {
        &self.config
    }

    pub fn harmonize(&self, events: &[MelodyEvent], key: Key) -> Result<Harmonization, HarmonizeError> {
        let vocabulary = ChordVocabulary::for_key(key);
        let slots = select_slots(events, self.config.strength_threshold)?;
        let candidates = derive_candidates(&slots, vocabulary)?;
        let candidates = propagate(candidates, &self.config.grammar)?;

        let top_notes: Vec<u8> = slots.iter().map(|s| s.pitch_class()).collect();
        let progressions = enumerate_progressions(
            &candidates,
            &self.config.grammar,
            vocabulary,
            &top_notes,
            &self.config.search_config(),
        )?;

        info!(
            tonic = key.tonic_pc(),
            mode = %key.mode(),
            slots = slots.len(),
            progressions = progressions.len(),
            nodes = progressions.nodes_expanded,
            "harmonization search complete"
        );

        if progressions.is_empty() {
            return Err(HarmonizeError::NoValidProgression { slots: slots.len() });
        }

        Ok(Harmonization {
            key,
            vocabulary,
            slots,
            candidates,
            progressions,
        })
    }
}

/// Harmonize with the default configuration.
pub fn harmonize(events: &[MelodyEvent], tonic_pc: u8, mode: Mode) -> Result<Harmonization, HarmonizeError> {
    Harmonizer::default().harmonize(events, Key::new(tonic_pc, mode))
}
