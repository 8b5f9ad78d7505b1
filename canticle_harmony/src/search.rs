// Backtracking enumeration of valid degree progressions.
//
// Walks the pruned candidate sets depth-first, one slot per level. From a
// prefix ending in degree `cur`, slot p+1 may take any candidate `nxt` with
// `cur -> nxt` in the grammar and `nxt != cur`. Every complete progression
// is then checked for parallel fifths; rejected ones are dropped but do not
// prune anything above them, so the walk carries on.
//
// All inputs are borrowed immutably. The prefix lives in one Vec owned by
// the search state and is pushed/popped around each recursive call.
//
// The space is finite (at most 7^n leaves) but can be large. Every extension
// of a prefix counts as one node expansion against `SearchConfig::node_budget`,
// and the slot count is capped by `max_depth`; exceeding either aborts with
// `SearchBudgetExceeded`.

use crate::candidates::CandidateSet;
use crate::degree::Degree;
use crate::error::HarmonizeError;
use crate::fifths::find_parallel_fifths;
use crate::grammar::Grammar;
use crate::vocabulary::ChordVocabulary;
use std::fmt;
use std::ops::Deref;
use tracing::{debug, trace};

/// One degree per harmonized slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Progression(Vec<Degree>);

impl Progression {
    pub fn new(degrees: Vec<Degree>) -> Self {
        Progression(degrees)
    }

    pub fn degrees(&self) -> &[Degree] {
        &self.0
    }

    /// Degree numbers 1-7, for callers that want plain integers.
    pub fn numbers(&self) -> Vec<u8> {
        self.0.iter().map(|d| d.number()).collect()
    }
}

impl Deref for Progression {
    type Target = [Degree];

    fn deref(&self) -> &[Degree] {
        &self.0
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

/// Search limits.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of prefix extensions before giving up.
    pub node_budget: u64,
    /// Maximum number of slots (recursion depth).
    pub max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            node_budget: 1_000_000,
            max_depth: 4096,
        }
    }
}

/// Every progression that passed all constraints, plus search statistics.
#[derive(Debug, Clone, Default)]
pub struct ProgressionSet {
    pub progressions: Vec<Progression>,
    /// Prefix extensions performed.
    pub nodes_expanded: u64,
    /// Complete progressions discarded for parallel fifths.
    pub rejected_parallel_fifths: usize,
}

impl ProgressionSet {
    pub fn len(&self) -> usize {
        self.progressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progressions.is_empty()
    }

    pub fn contains(&self, degrees: &[Degree]) -> bool {
        self.progressions.iter().any(|p| p.degrees() == degrees)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Progression> {
        self.progressions.iter()
    }
}

/// Borrowed, read-only inputs plus the mutable walk state.
struct SearchState<'a> {
    candidates: &'a CandidateSet,
    grammar: &'a Grammar,
    vocab: &'a ChordVocabulary,
    top_notes: &'a [u8],
    budget: u64,
    prefix: Vec<Degree>,
    result: ProgressionSet,
}

/// Enumerate all valid progressions.
///
/// `top_notes` holds the melody pitch of each slot and must be as long as
/// `candidates`. An empty result is not an error here; the caller decides.
pub fn enumerate_progressions(
    candidates: &CandidateSet,
    grammar: &Grammar,
    vocab: &ChordVocabulary,
    top_notes: &[u8],
    config: &SearchConfig,
) -> Result<ProgressionSet, HarmonizeError> {
    debug_assert_eq!(candidates.len(), top_notes.len());
    if candidates.len() > config.max_depth {
        return Err(HarmonizeError::SearchBudgetExceeded {
            budget: config.max_depth as u64,
        });
    }
    if candidates.is_empty() {
        return Ok(ProgressionSet::default());
    }

    let mut state = SearchState {
        candidates,
        grammar,
        vocab,
        top_notes,
        budget: config.node_budget,
        prefix: Vec::with_capacity(candidates.len()),
        result: ProgressionSet::default(),
    };

    for start in candidates.get(0).iter() {
        state.prefix.push(start);
        extend(&mut state)?;
        state.prefix.pop();
    }

    debug!(
        found = state.result.len(),
        nodes = state.result.nodes_expanded,
        rejected = state.result.rejected_parallel_fifths,
        "progression search finished"
    );
    Ok(state.result)
}

fn extend(state: &mut SearchState<'_>) -> Result<(), HarmonizeError> {
    let depth = state.prefix.len() - 1;
    let size = state.candidates.len();

    if depth == size - 1 {
        match find_parallel_fifths(&state.prefix, state.top_notes, state.vocab) {
            Some(at) => {
                trace!(progression = ?state.prefix, at, "rejected for parallel fifths");
                state.result.rejected_parallel_fifths += 1;
            }
            None => state.result.progressions.push(Progression(state.prefix.clone())),
        }
        return Ok(());
    }

    let cur = state.prefix[depth];
    let options = state.candidates.get(depth + 1);
    for nxt in options.iter() {
        if nxt == cur || !state.grammar.allows(cur, nxt) {
            continue;
        }
        state.result.nodes_expanded += 1;
        if state.result.nodes_expanded > state.budget {
            return Err(HarmonizeError::SearchBudgetExceeded { budget: state.budget });
        }
        if state.result.nodes_expanded % 100_000 == 0 {
            trace!(nodes = state.result.nodes_expanded, depth = depth + 1, "search progress");
        }
        state.prefix.push(nxt);
        extend(state)?;
        state.prefix.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degree::DegreeSet;
    use crate::fifths::has_parallel_fifths;
    use crate::mode::Key;
    use Degree::*;

    fn cands(sets: &[&[Degree]]) -> CandidateSet {
        CandidateSet::from_sets(sets.iter().map(|s| s.iter().copied().collect::<DegreeSet>()).collect())
    }

    fn run(c: &CandidateSet, tops: &[u8]) -> ProgressionSet {
        let vocab = ChordVocabulary::for_key(Key::c_major());
        enumerate_progressions(c, Grammar::standard(), vocab, tops, &SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_cadence_scenario() {
        // Post-propagation sets for melody C F G C in C major.
        let c = cands(&[&[I], &[II, IV, V, VII], &[I, V], &[I]]);
        let result = run(&c, &[0, 5, 7, 0]);
        assert!(result.contains(&[I, IV, V, I]));
        let all: Vec<String> = result.iter().map(|p| p.to_string()).collect();
        assert_eq!(all, vec!["I II V I", "I IV V I"]);
    }

    #[test]
    fn test_no_immediate_repetition() {
        // I -> I is grammatical but never emitted.
        let c = cands(&[&[I], &[I, V], &[I]]);
        let result = run(&c, &[0, 7, 0]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.progressions[0].degrees(), &[I, V, I]);
    }

    #[test]
    fn test_grammar_respected() {
        let c = cands(&[&[I], &[II, III, IV, V, VI, VII], &[I, II, IV, V, VI], &[V, VII], &[I]]);
        let tops = [0, 2, 5, 7, 0];
        let result = run(&c, &tops);
        assert!(!result.is_empty());
        let g = Grammar::standard();
        for p in result.iter() {
            for w in p.windows(2) {
                assert!(g.allows(w[0], w[1]), "{} breaks grammar", p);
                assert_ne!(w[0], w[1], "{} repeats a degree", p);
            }
        }
    }

    #[test]
    fn test_parallel_fifths_filtered() {
        // Top note C throughout: IV (root F) and II (bass F) both form fifths.
        let c = cands(&[&[I], &[IV], &[II], &[V], &[I]]);
        let tops = [0, 0, 0, 2, 0];
        let result = run(&c, &tops);
        assert!(result.is_empty());
        assert_eq!(result.rejected_parallel_fifths, 1);

        let vocab = ChordVocabulary::for_key(Key::c_major());
        assert!(has_parallel_fifths(&[I, IV, II, V, I], &tops, vocab));
    }

    #[test]
    fn test_budget_exceeded() {
        let c = cands(&[&[I], &[II, IV, V, VII], &[I, V], &[I]]);
        let vocab = ChordVocabulary::for_key(Key::c_major());
        let config = SearchConfig {
            node_budget: 3,
            ..SearchConfig::default()
        };
        let err = enumerate_progressions(&c, Grammar::standard(), vocab, &[0, 5, 7, 0], &config).unwrap_err();
        assert_eq!(err, HarmonizeError::SearchBudgetExceeded { budget: 3 });
    }

    #[test]
    fn test_depth_limit() {
        let c = cands(&[&[I], &[V], &[I]]);
        let vocab = ChordVocabulary::for_key(Key::c_major());
        let config = SearchConfig {
            max_depth: 2,
            ..SearchConfig::default()
        };
        assert!(matches!(
            enumerate_progressions(&c, Grammar::standard(), vocab, &[0, 7, 0], &config),
            Err(HarmonizeError::SearchBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_dead_end_yields_empty() {
        // III cannot follow V, so nothing reaches the last slot.
        let c = cands(&[&[I], &[V], &[III], &[I]]);
        let result = run(&c, &[0, 7, 4, 0]);
        assert!(result.is_empty());
        assert_eq!(result.rejected_parallel_fifths, 0);
    }
}
