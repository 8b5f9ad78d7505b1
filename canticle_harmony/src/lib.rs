// Canticle Harmony
//
// A diatonic harmonizer for monophonic melodies. Given a melody whose notes
// carry beat strengths, and a key (tonic plus major or minor mode), it finds
// every chord progression that fits the strong-beat notes, respects a
// first-order grammar of permitted degree transitions, opens and closes on I,
// approaches the close from V, and avoids parallel fifths against the melody.
// One progression is then chosen and voiced under the melody.
//
// Architecture:
// - degree.rs: Scale degrees I..VII and the compact `DegreeSet` bitset
// - mode.rs: Major/minor modes, keys, and scale membership
// - vocabulary.rs: The seven diatonic chords of a key (V is a dominant seventh)
// - grammar.rs: Permitted degree transitions (standard table or from config)
// - melody.rs: Melody events and strong-beat slot selection
// - candidates.rs: Per-slot chord candidates from melody pitch classes
// - propagate.rs: Boundary constraints plus one forward arc-consistency sweep
// - fifths.rs: Parallel-fifths test between consecutive slots
// - search.rs: Exhaustive depth-first enumeration of valid progressions
// - voicing.rs: Stacking chord tones below the melody note
// - harmonizer.rs: The end-to-end pipeline, progression choice and realization
// - error.rs: `HarmonizeError`, the typed failure of every pipeline stage
// - config.rs: `HarmonizerConfig` tunables, loadable from JSON
// - meter.rs: Beat strengths from time signatures
// - midi.rs: Melody import from and harmonization export to MIDI files
// - names.rs: Note names for display and tonic parsing
//
// Everything up to the final choice is deterministic. The choice takes a
// caller-supplied RNG, so a seeded RNG reproduces the output exactly.

pub mod candidates;
pub mod config;
pub mod degree;
pub mod error;
pub mod fifths;
pub mod grammar;
pub mod harmonizer;
pub mod melody;
pub mod meter;
pub mod midi;
pub mod mode;
pub mod names;
pub mod propagate;
pub mod search;
pub mod vocabulary;
pub mod voicing;

pub use config::HarmonizerConfig;
pub use degree::{Degree, DegreeSet};
pub use error::HarmonizeError;
pub use harmonizer::{Harmonization, Harmonizer, VoicedSlot, harmonize};
pub use melody::MelodyEvent;
pub use mode::{Key, Mode};
pub use search::Progression;
