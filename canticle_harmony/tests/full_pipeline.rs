// End-to-end tests through the public API: melodies in, progressions and
// MIDI out.

use canticle_harmony::error::Boundary;
use canticle_harmony::fifths::has_parallel_fifths;
use canticle_harmony::grammar::Grammar;
use canticle_harmony::meter::Meter;
use canticle_harmony::midi::{read_melody, write_harmonization};
use canticle_harmony::{Degree, HarmonizeError, Harmonization, MelodyEvent, Mode, harmonize};
use rand::SeedableRng;
use rand::rngs::StdRng;

use Degree::*;

/// Every note on a strong beat, one quarter apart.
fn strong_melody(pitches: &[u8]) -> Vec<MelodyEvent> {
    pitches
        .iter()
        .enumerate()
        .map(|(i, &p)| MelodyEvent::timed(p, 1.0, i as f64, 1.0))
        .collect()
}

/// Check every returned progression against the full rule set. The
/// penultimate slot must have admitted V, but the emitted degree there is
/// free.
fn assert_all_valid(h: &Harmonization) {
    let top: Vec<u8> = h.slots().iter().map(|s| s.pitch_class()).collect();
    let n = h.slots().len();
    assert!(h.candidates().get(n - 2).contains(V));
    for p in h.progressions().iter() {
        assert_eq!(p.len(), n);
        assert_eq!(p[0], I, "{}", p);
        assert_eq!(p[n - 1], I, "{}", p);
        for (i, &degree) in p.iter().enumerate() {
            assert!(h.vocabulary().chord(degree).contains(top[i]), "{} at slot {}", p, i);
        }
        for pair in p.windows(2) {
            assert_ne!(pair[0], pair[1], "{}", p);
            assert!(Grammar::standard().allows(pair[0], pair[1]), "{}", p);
        }
        assert!(!has_parallel_fifths(p, &top, h.vocabulary()), "{}", p);
    }
}

#[test]
fn test_plagal_approach_scenario() {
    // C F G C in C major, strengths 1.0 0.6 0.8 1.0.
    let events: Vec<MelodyEvent> = [(60, 1.0), (65, 0.6), (67, 0.8), (72, 1.0)]
        .iter()
        .enumerate()
        .map(|(i, &(p, s))| MelodyEvent::timed(p, s, i as f64, 1.0))
        .collect();
    let h = harmonize(&events, 0, Mode::Major).unwrap();
    assert_eq!(h.slots().len(), 4);
    assert!(h.progressions().contains(&[I, IV, V, I]));
    assert_all_valid(&h);
}

#[test]
fn test_minor_key_scenario() {
    // A D E A in A minor.
    let h = harmonize(&strong_melody(&[69, 74, 76, 69]), 9, Mode::Minor).unwrap();
    let found: Vec<String> = h.progressions().iter().map(|p| p.to_string()).collect();
    assert_eq!(found, vec!["I II V I", "I IV V I"]);
    assert_all_valid(&h);
}

#[test]
fn test_longer_descending_line() {
    // C A F G E D C.
    let h = harmonize(&strong_melody(&[72, 69, 65, 67, 64, 62, 60]), 0, Mode::Major).unwrap();
    assert!(h.progressions().contains(&[I, IV, II, V, I, V, I]));
    assert_all_valid(&h);
}

#[test]
fn test_penultimate_slot_not_forced_to_dominant() {
    // D admits V, VII. V is only required to be possible there, so VII -> I
    // closes the line as well.
    let h = harmonize(&strong_melody(&[72, 69, 65, 67, 64, 62, 60]), 0, Mode::Major).unwrap();
    assert!(h.progressions().contains(&[I, IV, II, V, I, VII, I]));
    assert!(h.progressions().iter().any(|p| p[5] != V));
    assert_all_valid(&h);
}

#[test]
fn test_chromatic_note_has_no_chord() {
    let err = harmonize(&strong_melody(&[60, 61, 60]), 0, Mode::Major).unwrap_err();
    assert_eq!(
        err,
        HarmonizeError::EmptyCandidateSet {
            slot: 1,
            position: 1,
            pitch: 61
        }
    );
}

#[test]
fn test_too_few_strong_notes() {
    let events = vec![
        MelodyEvent::timed(60, 1.0, 0.0, 1.0),
        MelodyEvent::timed(62, 0.125, 1.0, 1.0),
        MelodyEvent::timed(60, 1.0, 2.0, 1.0),
    ];
    assert_eq!(
        harmonize(&events, 0, Mode::Major).unwrap_err(),
        HarmonizeError::InsufficientSlots { found: 2 }
    );
}

#[test]
fn test_melody_must_open_on_tonic_chord() {
    // D admits II, V, VII but not I.
    let err = harmonize(&strong_melody(&[62, 67, 60]), 0, Mode::Major).unwrap_err();
    assert_eq!(
        err,
        HarmonizeError::MissingTonicBoundary {
            slot: 0,
            boundary: Boundary::First
        }
    );
    assert_eq!(err.to_string(), "There must be I in first position (slot 0)");
}

#[test]
fn test_transposition_preserves_progressions() {
    let c = harmonize(&strong_melody(&[72, 69, 65, 67, 64, 62, 60]), 0, Mode::Major).unwrap();
    let d = harmonize(&strong_melody(&[74, 71, 67, 69, 66, 64, 62]), 2, Mode::Major).unwrap();
    let c_found: Vec<String> = c.progressions().iter().map(|p| p.to_string()).collect();
    let d_found: Vec<String> = d.progressions().iter().map(|p| p.to_string()).collect();
    assert_eq!(c_found, d_found);
}

#[test]
fn test_midi_write_then_read() {
    let events = strong_melody(&[60, 65, 67, 72]);
    let h = harmonize(&events, 0, Mode::Major).unwrap();
    let chosen = h.choose(&mut StdRng::seed_from_u64(3)).clone();
    let voiced = h.realize(&chosen);
    assert_eq!(voiced.len(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.mid");
    write_harmonization(&path, &events, &voiced, Meter::common_time(), 96.0).unwrap();

    let imported = read_melody(&path).unwrap();
    assert_eq!(imported.meter, Meter::common_time());
    // The melody sits above every chord, so it survives the top-line reduction.
    let pitches: Vec<u8> = imported.events.iter().map(|e| e.pitch).collect();
    assert_eq!(pitches, vec![60, 65, 67, 72]);
    let strengths: Vec<f64> = imported.events.iter().map(|e| e.beat_strength).collect();
    assert_eq!(strengths, vec![1.0, 0.25, 0.5, 0.25]);
}

#[test]
fn test_missing_midi_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_melody(&dir.path().join("absent.mid")).is_err());
}
