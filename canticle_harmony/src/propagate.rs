// Constraint propagation over candidate sets.
//
// Applies the fixed frame of a harmonization and then one forward pruning
// sweep driven by the grammar. Rules, in order:
//
// 1. The first slot must admit I; it is narrowed to {I}.
// 2. The last slot must admit I; it is narrowed to {I}.
// 3. The penultimate slot must admit V (checked, not narrowed).
// 4. For p = 1 ..= n-2: drop from slot p every degree with no grammar
//    successor among slot p+1's candidates, then drop from slot p+1 every
//    degree that no remaining slot-p candidate leads to.
//
// Rule 4 is a single left-to-right pass, not a fixpoint: a removal at p+1 is
// not pushed back into p, and slot 1 is never pruned against slot 0. Search
// re-checks every edge, so anything left in a set here is only a candidate.
//
// Takes the candidate set by value and returns the finalized snapshot that
// search.rs reads.

use crate::candidates::CandidateSet;
use crate::degree::{Degree, DegreeSet};
use crate::error::{Boundary, HarmonizeError};
use crate::grammar::Grammar;
use tracing::debug;

/// Run rules 1-4 and return the pruned candidates.
pub fn propagate(mut candidates: CandidateSet, grammar: &Grammar) -> Result<CandidateSet, HarmonizeError> {
    let size = candidates.len();
    if size < crate::melody::MIN_SLOTS {
        return Err(HarmonizeError::InsufficientSlots { found: size });
    }
    let last = size - 1;
    let penultimate = size - 2;

    if !candidates.get(0).contains(Degree::I) {
        return Err(HarmonizeError::MissingTonicBoundary {
            slot: 0,
            boundary: Boundary::First,
        });
    }
    candidates.set(0, DegreeSet::single(Degree::I));

    if !candidates.get(last).contains(Degree::I) {
        return Err(HarmonizeError::MissingTonicBoundary {
            slot: last,
            boundary: Boundary::Last,
        });
    }
    candidates.set(last, DegreeSet::single(Degree::I));

    if !candidates.get(penultimate).contains(Degree::V) {
        return Err(HarmonizeError::MissingDominantCadence { slot: penultimate });
    }

    for p in 1..=penultimate {
        let next = candidates.get(p + 1);

        let before = candidates.get(p);
        let current: DegreeSet = before
            .iter()
            .filter(|&d| grammar.successors(d).intersects(next))
            .collect();
        if current != before {
            debug!(slot = p, from = %before, to = %current, "pruned degrees without a successor");
        }
        candidates.set(p, current);

        let reachable = grammar.successors_of_set(current);
        let pruned_next = next.intersection(reachable);
        if pruned_next != next {
            debug!(slot = p + 1, from = %next, to = %pruned_next, "pruned unreachable degrees");
        }
        candidates.set(p + 1, pruned_next);
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(degrees: &[Degree]) -> DegreeSet {
        degrees.iter().copied().collect()
    }

    fn cands(sets: &[&[Degree]]) -> CandidateSet {
        CandidateSet::from_sets(sets.iter().map(|s| set(s)).collect())
    }

    use Degree::*;

    #[test]
    fn test_boundaries_forced_to_tonic() {
        let c = cands(&[&[I, IV, VI], &[II, IV, V, VII], &[I, III, V], &[I, IV, VI]]);
        let out = propagate(c, Grammar::standard()).unwrap();
        assert_eq!(out.get(0), DegreeSet::single(I));
        assert_eq!(out.get(3), DegreeSet::single(I));
    }

    #[test]
    fn test_forward_sweep_prunes_unreachable() {
        let c = cands(&[&[I, IV, VI], &[II, IV, V, VII], &[I, III, V], &[I, IV, VI]]);
        let out = propagate(c, Grammar::standard()).unwrap();
        // Every slot-1 degree reaches I or V.
        assert_eq!(out.get(1), set(&[II, IV, V, VII]));
        // III follows none of II, IV, V, VII.
        assert_eq!(out.get(2), set(&[I, V]));
    }

    #[test]
    fn test_missing_first_tonic() {
        let c = cands(&[&[II, V, VII], &[I, IV], &[V], &[I]]);
        assert_eq!(
            propagate(c, Grammar::standard()),
            Err(HarmonizeError::MissingTonicBoundary {
                slot: 0,
                boundary: Boundary::First
            })
        );
    }

    #[test]
    fn test_missing_last_tonic() {
        let c = cands(&[&[I], &[IV], &[V], &[II, V, VII]]);
        assert_eq!(
            propagate(c, Grammar::standard()),
            Err(HarmonizeError::MissingTonicBoundary {
                slot: 3,
                boundary: Boundary::Last
            })
        );
    }

    #[test]
    fn test_missing_dominant_cadence() {
        let c = cands(&[&[I], &[IV], &[I, III], &[I]]);
        assert_eq!(
            propagate(c, Grammar::standard()),
            Err(HarmonizeError::MissingDominantCadence { slot: 2 })
        );
    }

    #[test]
    fn test_penultimate_not_narrowed() {
        let c = cands(&[&[I], &[I, V], &[I]]);
        let out = propagate(c, Grammar::standard()).unwrap();
        // Both I -> I and V -> I are grammatical, so both survive.
        assert_eq!(out.get(1), set(&[I, V]));
    }

    #[test]
    fn test_single_pass_does_not_revisit() {
        // Slot 2 loses VI when pruned against slot 3, but slot 1's III (whose
        // only link into slot 2 was VI) was already checked against the
        // unpruned slot 2 and stays.
        let c = cands(&[&[I], &[III, IV], &[V, VI], &[I]]);
        let out = propagate(c, Grammar::standard()).unwrap();
        assert!(out.get(1).contains(III));
    }
}
