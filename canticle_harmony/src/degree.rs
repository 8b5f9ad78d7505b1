// Scale degrees and compact degree sets.
//
// A harmonization assigns one diatonic chord per slot, identified by its
// scale degree I through VII. Candidate sets, grammar successor lists, and
// propagation all work on small sets of degrees, so `DegreeSet` packs them
// into a 7-bit mask. Iteration is always in ascending degree order, which
// keeps candidate listing and progression enumeration deterministic.
//
// Used by every other module; has no dependencies inside the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A diatonic scale degree. The discriminant is the conventional 1-based number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Degree {
    I = 1,
    II = 2,
    III = 3,
    IV = 4,
    V = 5,
    VI = 6,
    VII = 7,
}

impl Degree {
    pub const ALL: [Degree; 7] = [
        Degree::I,
        Degree::II,
        Degree::III,
        Degree::IV,
        Degree::V,
        Degree::VI,
        Degree::VII,
    ];

    /// 1-based degree number (I = 1, VII = 7).
    pub fn number(self) -> u8 {
        self as u8
    }

    /// 0-based index, for table lookups.
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn from_number(n: u8) -> Option<Degree> {
        match n {
            1..=7 => Some(Degree::ALL[n as usize - 1]),
            _ => None,
        }
    }

    pub fn roman(self) -> &'static str {
        match self {
            Degree::I => "I",
            Degree::II => "II",
            Degree::III => "III",
            Degree::IV => "IV",
            Degree::V => "V",
            Degree::VI => "VI",
            Degree::VII => "VII",
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.roman())
    }
}

/// A set of scale degrees stored as a bitmask (bit 0 = I, bit 6 = VII).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DegreeSet(u8);

impl DegreeSet {
    pub const EMPTY: DegreeSet = DegreeSet(0);
    pub const FULL: DegreeSet = DegreeSet(0b111_1111);

    /// Build from a raw mask; bits above VII are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        DegreeSet(bits & 0b111_1111)
    }

    pub fn single(degree: Degree) -> Self {
        DegreeSet(degree.bit())
    }

    pub fn contains(self, degree: Degree) -> bool {
        self.0 & degree.bit() != 0
    }

    pub fn insert(&mut self, degree: Degree) {
        self.0 |= degree.bit();
    }

    pub fn remove(&mut self, degree: Degree) {
        self.0 &= !degree.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn intersects(self, other: DegreeSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: DegreeSet) -> DegreeSet {
        DegreeSet(self.0 | other.0)
    }

    pub fn intersection(self, other: DegreeSet) -> DegreeSet {
        DegreeSet(self.0 & other.0)
    }

    /// Degrees in ascending order.
    pub fn iter(self) -> impl Iterator<Item = Degree> {
        Degree::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Degree> for DegreeSet {
    fn from_iter<T: IntoIterator<Item = Degree>>(iter: T) -> Self {
        let mut set = DegreeSet::EMPTY;
        for d in iter {
            set.insert(d);
        }
        set
    }
}

impl fmt::Display for DegreeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, d) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", d)?;
        }
        f.write_str("}")
    }
}
