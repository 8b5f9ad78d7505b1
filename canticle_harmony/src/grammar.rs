// Degree grammar: which chord may follow which.
//
// A directed graph over I-VII; an edge a -> b means degree b may follow
// degree a. The standard grammar is a compile-time constant shared by every
// run. Config files may supply a different grammar, which is validated and
// then treated as equally immutable.
//
// The grammar includes self-loops (I -> I). Propagation honours them;
// progression search separately forbids immediate repetition.

use crate::degree::{Degree, DegreeSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Successor sets indexed by degree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Degree, Vec<Degree>>", into = "BTreeMap<Degree, Vec<Degree>>")]
pub struct Grammar {
    successors: [DegreeSet; 7],
}

const fn mask(degrees: &[Degree]) -> u8 {
    let mut m = 0u8;
    let mut i = 0;
    while i < degrees.len() {
        m |= 1 << (degrees[i] as u8 - 1);
        i += 1;
    }
    m
}

/// The standard progression grammar.
pub static STANDARD: Grammar = Grammar::from_masks([
    mask(&[Degree::I, Degree::II, Degree::III, Degree::IV, Degree::V, Degree::VII]), // I
    mask(&[Degree::V, Degree::VII]),                                                 // II
    mask(&[Degree::IV, Degree::VI]),                                                 // III
    mask(&[Degree::I, Degree::II, Degree::V, Degree::VII]),                          // IV
    mask(&[Degree::I, Degree::VI, Degree::VII]),                                     // V
    mask(&[Degree::II, Degree::IV]),                                                 // VI
    mask(&[Degree::I]),                                                              // VII
]);

impl Grammar {
    const fn from_masks(masks: [u8; 7]) -> Self {
        Grammar {
            successors: [
                DegreeSet::from_bits(masks[0]),
                DegreeSet::from_bits(masks[1]),
                DegreeSet::from_bits(masks[2]),
                DegreeSet::from_bits(masks[3]),
                DegreeSet::from_bits(masks[4]),
                DegreeSet::from_bits(masks[5]),
                DegreeSet::from_bits(masks[6]),
            ],
        }
    }

    pub fn standard() -> &'static Grammar {
        &STANDARD
    }

    pub fn successors(&self, degree: Degree) -> DegreeSet {
        self.successors[degree.index()]
    }

    /// Whether `next` may follow `current`.
    pub fn allows(&self, current: Degree, next: Degree) -> bool {
        self.successors(current).contains(next)
    }

    /// Union of the successors of every degree in `set`.
    pub fn successors_of_set(&self, set: DegreeSet) -> DegreeSet {
        set.iter()
            .fold(DegreeSet::EMPTY, |acc, d| acc.union(self.successors(d)))
    }

    /// All edges, in degree order.
    pub fn edges(&self) -> impl Iterator<Item = (Degree, Degree)> + '_ {
        Degree::ALL
            .into_iter()
            .flat_map(move |from| self.successors(from).iter().map(move |to| (from, to)))
    }
}

impl Default for Grammar {
    fn default() -> Self {
        STANDARD.clone()
    }
}

impl TryFrom<BTreeMap<Degree, Vec<Degree>>> for Grammar {
    type Error = String;

    fn try_from(map: BTreeMap<Degree, Vec<Degree>>) -> Result<Self, Self::Error> {
        let mut successors = [DegreeSet::EMPTY; 7];
        for (from, tos) in map {
            successors[from.index()] = tos.into_iter().collect();
        }
        if !successors[Degree::I.index()].iter().any(|d| d != Degree::I) {
            return Err("grammar must allow at least one degree after I".to_string());
        }
        if !Degree::ALL.iter().any(|d| successors[d.index()].contains(Degree::I) && *d != Degree::I) {
            return Err("grammar must allow a return to I".to_string());
        }
        Ok(Grammar { successors })
    }
}

impl From<Grammar> for BTreeMap<Degree, Vec<Degree>> {
    fn from(grammar: Grammar) -> Self {
        Degree::ALL
            .into_iter()
            .map(|d| (d, grammar.successors(d).iter().collect()))
            .collect()
    }
}
