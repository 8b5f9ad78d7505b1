// Tonal modes and keys.
//
// The harmonizer works in modern major/minor tonality only. Minor uses the
// harmonic form (raised 7th) so that V is a true dominant and VII a
// diminished triad, matching the chord tables in vocabulary.rs.
//
// This module provides:
// - `Mode` with its scale offsets and string parsing
// - `Key`: a mode plus tonic pitch class, with pitch-to-degree mapping
//
// Parsing an unknown mode name is the `UnsupportedMode` error; every other
// module receives an already-validated `Mode`.

use crate::degree::Degree;
use crate::error::HarmonizeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// C D E F G A B
    Major,
    /// C D Eb F G Ab B  (harmonic minor)
    Minor,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Major, Mode::Minor];

    /// Semitone offsets from the tonic to each scale degree I-VII.
    pub fn scale_offsets(self) -> [u8; 7] {
        match self {
            Mode::Major => [0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => [0, 2, 3, 5, 7, 8, 11],
        }
    }

    pub fn index(self) -> usize {
        match self {
            Mode::Major => 0,
            Mode::Minor => 1,
        }
    }
}

impl FromStr for Mode {
    type Err = HarmonizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(Mode::Major),
            "minor" => Ok(Mode::Minor),
            _ => Err(HarmonizeError::UnsupportedMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => write!(f, "major"),
            Mode::Minor => write!(f, "minor"),
        }
    }
}

/// A key: mode plus tonic pitch class.
///
/// The tonic is always reduced to 0..12; every constructor, including
/// deserialization, goes through `Key::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KeyFields")]
pub struct Key {
    tonic_pc: u8,
    mode: Mode,
}

#[derive(Deserialize)]
struct KeyFields {
    tonic_pc: u8,
    mode: Mode,
}

impl From<KeyFields> for Key {
    fn from(fields: KeyFields) -> Self {
        Key::new(fields.tonic_pc, fields.mode)
    }
}

impl Key {
    pub fn new(tonic_pc: u8, mode: Mode) -> Self {
        Key {
            tonic_pc: tonic_pc % 12,
            mode,
        }
    }

    /// Pitch class of the tonic (0 = C, 2 = D, ...).
    pub fn tonic_pc(&self) -> u8 {
        self.tonic_pc
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn c_major() -> Self {
        Key::new(0, Mode::Major)
    }

    /// Pitch class of the root of the given degree.
    pub fn degree_root(&self, degree: Degree) -> u8 {
        (self.tonic_pc + self.mode.scale_offsets()[degree.index()]) % 12
    }

    /// The scale degree a pitch falls on, or None if it is outside the scale.
    pub fn scale_degree(&self, pitch: u8) -> Option<Degree> {
        let pc = (pitch % 12 + 12 - self.tonic_pc) % 12;
        self.mode
            .scale_offsets()
            .iter()
            .position(|&off| off == pc)
            .and_then(|i| Degree::from_number(i as u8 + 1))
    }

    pub fn is_in_key(&self, pitch: u8) -> bool {
        self.scale_degree(pitch).is_some()
    }

    /// Whether the key signature is conventionally written with flats.
    /// Minor keys follow their relative major.
    pub fn uses_flats(&self) -> bool {
        let major_tonic = match self.mode {
            Mode::Major => self.tonic_pc,
            Mode::Minor => (self.tonic_pc + 3) % 12,
        };
        matches!(major_tonic, 1 | 3 | 5 | 8 | 10)
    }
}
