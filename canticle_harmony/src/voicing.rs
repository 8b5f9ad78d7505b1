// Chord voicing under a melody note.
//
// Turns a degree's pitch-class list into concrete MIDI pitches. The first
// tone is placed in the octave below the melody note's octave; each further
// tone is raised by whole octaves until it is strictly above the previous
// one, giving a close, ascending, non-overlapping stack.
//
// II is voiced in first inversion (third, fifth, root), the same assumption
// the parallel-fifths rule makes about its bass.

use crate::degree::Degree;
use tracing::warn;

/// Highest valid MIDI pitch.
const MAX_PITCH: u16 = 127;

/// Voice `tones` (pitch classes, root first) under `melody_pitch`.
///
/// Tones that would land above the MIDI range are dropped.
pub fn voice_chord(melody_pitch: u8, degree: Degree, tones: &[u8]) -> Vec<u8> {
    let mut order: Vec<u8> = tones.to_vec();
    if degree == Degree::II && order.len() >= 3 {
        order = vec![tones[1], tones[2], tones[0]];
    }

    let base = (melody_pitch as u16 / 12).saturating_sub(1) * 12;
    let mut stacked: Vec<u16> = Vec::with_capacity(order.len());
    for &pc in &order {
        let mut note = base + (pc % 12) as u16;
        if let Some(&prev) = stacked.last() {
            while note <= prev {
                note += 12;
            }
        }
        stacked.push(note);
    }

    let voiced: Vec<u8> = stacked.iter().filter(|&&n| n <= MAX_PITCH).map(|&n| n as u8).collect();
    if voiced.len() < stacked.len() {
        warn!(melody_pitch, %degree, dropped = stacked.len() - voiced.len(), "chord tones above MIDI range dropped");
    }
    voiced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tonic_under_middle_c() {
        assert_eq!(voice_chord(60, Degree::I, &[0, 4, 7]), vec![48, 52, 55]);
    }

    #[test]
    fn test_second_degree_inverted() {
        // D minor under C4: F3 A3 D4.
        assert_eq!(voice_chord(60, Degree::II, &[2, 5, 9]), vec![53, 57, 62]);
    }

    #[test]
    fn test_dominant_seventh_stacks_upward() {
        // G B D F under G4 (67): G3 B3 D4 F4.
        assert_eq!(voice_chord(67, Degree::V, &[7, 11, 2, 5]), vec![55, 59, 62, 65]);
    }

    #[test]
    fn test_voicing_strictly_ascending() {
        for melody in [36u8, 59, 60, 71, 84] {
            for tones in [&[9u8, 0, 4][..], &[11, 2, 5][..], &[7, 11, 2, 5][..]] {
                let notes = voice_chord(melody, Degree::VI, tones);
                assert!(notes.windows(2).all(|w| w[0] < w[1]), "{:?} not ascending", notes);
            }
        }
    }

    #[test]
    fn test_low_melody_clamps_to_octave_zero() {
        assert_eq!(voice_chord(5, Degree::I, &[0, 4, 7]), vec![0, 4, 7]);
    }

    #[test]
    fn test_top_octave_stays_in_range() {
        // Melody in the top octave: base octave 108; F, A, C stack to 113, 117, 120.
        assert_eq!(voice_chord(127, Degree::IV, &[5, 9, 0]), vec![113, 117, 120]);
    }

    #[test]
    fn test_out_of_range_tones_dropped() {
        // B7 (V of E) from B 119: D# 123, F# 126, A would be 129.
        assert_eq!(voice_chord(127, Degree::V, &[11, 3, 6, 9]), vec![119, 123, 126]);
    }
}
