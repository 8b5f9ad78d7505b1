// Diatonic chord vocabulary.
//
// For a key, builds the seven chords I-VII as pitch-class lists: the root
// (tonic + scale offset) followed by the added tones (root + interval), in
// construction order. The order matters: the parallel-fifths rule and the
// voicer both address chord tones by position.
//
// V is a dominant seventh in both modes (four tones); every other degree is
// a triad, with VII diminished. The interval tables are constants and all 24
// vocabularies (12 tonics x 2 modes) are built once, on first use, into a
// process-wide table that callers borrow from.

use crate::degree::Degree;
use crate::mode::{Key, Mode};
use std::sync::LazyLock;

/// Intervals added above the root, per degree, in major.
const MAJOR_INTERVALS: [&[u8]; 7] = [
    &[4, 7],     // I
    &[3, 7],     // II
    &[3, 7],     // III
    &[4, 7],     // IV
    &[4, 7, 10], // V7
    &[3, 7],     // VI
    &[3, 6],     // VII (diminished)
];

/// Intervals added above the root, per degree, in (harmonic) minor.
const MINOR_INTERVALS: [&[u8]; 7] = [
    &[3, 7],     // I
    &[3, 6],     // II (diminished)
    &[4, 7],     // III
    &[3, 7],     // IV
    &[4, 7, 10], // V7, major third from the raised 7th
    &[4, 7],     // VI
    &[3, 6],     // VII (diminished, on the raised 7th)
];

fn intervals(mode: Mode) -> &'static [&'static [u8]; 7] {
    match mode {
        Mode::Major => &MAJOR_INTERVALS,
        Mode::Minor => &MINOR_INTERVALS,
    }
}

/// A chord as an ordered list of pitch classes: root first, then the added
/// tones in construction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub degree: Degree,
    tones: Vec<u8>,
}

impl Chord {
    fn build(degree: Degree, root: u8, added: &[u8]) -> Self {
        let mut tones = Vec::with_capacity(added.len() + 1);
        tones.push(root % 12);
        for &iv in added {
            tones.push((root + iv) % 12);
        }
        Chord { degree, tones }
    }

    pub fn tones(&self) -> &[u8] {
        &self.tones
    }

    pub fn root(&self) -> u8 {
        self.tones[0]
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        self.tones.contains(&(pitch_class % 12))
    }

    /// The chord tone sounding lowest in the harmonizer's voicing. II and VII
    /// are voiced in first inversion, so their bass is the third.
    pub fn bottom_note(&self) -> u8 {
        match self.degree {
            Degree::II | Degree::VII => self.tones[1],
            _ => self.tones[0],
        }
    }
}

/// The seven diatonic chords of a key, indexed by degree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordVocabulary {
    pub key: Key,
    chords: [Chord; 7],
}

impl ChordVocabulary {
    /// Build a vocabulary from scratch. Prefer `for_key`, which returns the
    /// shared precomputed instance.
    pub fn build(key: Key) -> Self {
        let table = intervals(key.mode());
        let chords = Degree::ALL.map(|d| Chord::build(d, key.degree_root(d), table[d.index()]));
        ChordVocabulary { key, chords }
    }

    /// The shared vocabulary for a key.
    pub fn for_key(key: Key) -> &'static ChordVocabulary {
        &VOCABULARIES[key.mode().index()][key.tonic_pc() as usize]
    }

    pub fn chord(&self, degree: Degree) -> &Chord {
        &self.chords[degree.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chord> {
        self.chords.iter()
    }
}

static VOCABULARIES: LazyLock<[[ChordVocabulary; 12]; 2]> = LazyLock::new(|| {
    Mode::ALL.map(|mode| std::array::from_fn(|tonic| ChordVocabulary::build(Key::new(tonic as u8, mode))))
});
