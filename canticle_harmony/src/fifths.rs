// Parallel-fifths detection for a complete progression.
//
// A slot "forms a fifth" when the interval from the chord's bottom note up to
// the melody note, reduced to a pitch class, is 6 or 7 semitones (diminished
// or perfect fifth). The bottom note is the root, except for II and VII which
// are voiced in first inversion and stand on their third (see
// `Chord::bottom_note`).
//
// A progression is rejected if any adjacent pair of slots both form a fifth.
// Both halves of the pair are measured against the melody note of the first
// slot of the pair: the rule compares how the two chords sit under the same
// top note, not the actual voice motion.

use crate::degree::Degree;
use crate::vocabulary::{Chord, ChordVocabulary};

/// Whether `chord` under melody pitch class `top` forms a fifth.
pub fn is_fifth(chord: &Chord, top: u8) -> bool {
    let interval = (top % 12 + 12 - chord.bottom_note()) % 12;
    interval == 7 || interval == 6
}

/// Index of the first slot i where slots i and i+1 both form a fifth, if any.
///
/// `top_notes` holds the melody pitch for each slot, aligned with `progression`.
/// Pairs past the end of `top_notes` have no melody note and are not checked.
pub fn find_parallel_fifths(progression: &[Degree], top_notes: &[u8], vocab: &ChordVocabulary) -> Option<usize> {
    progression
        .windows(2)
        .zip(top_notes)
        .enumerate()
        .find_map(|(i, (pair, &top))| {
            let here = is_fifth(vocab.chord(pair[0]), top);
            (here && is_fifth(vocab.chord(pair[1]), top)).then_some(i)
        })
}

pub fn has_parallel_fifths(progression: &[Degree], top_notes: &[u8], vocab: &ChordVocabulary) -> bool {
    find_parallel_fifths(progression, top_notes, vocab).is_some()
}
