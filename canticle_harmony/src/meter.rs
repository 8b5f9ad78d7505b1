// Metric strength of note onsets.
//
// Ingestion needs a beat strength per note. Strength follows the metrical
// hierarchy: the downbeat is 1.0 and each level of subdivision halves it.
// A measure is first split into its beat groups (4/4 -> 2 halves -> 4
// quarters, 3/4 -> 3 quarters, 6/8 -> 2 dotted quarters -> 6 eighths), and
// below the notated beat every level splits in two. So in 4/4: beat 1 = 1.0,
// beat 3 = 0.5, beats 2 and 4 = 0.25, off-beat eighths = 0.125.
//
// Work is done in integer ticks to avoid float modulo drift. The meter is
// assumed constant from tick 0.

use serde::{Deserialize, Serialize};

/// Subdivision levels below which an onset counts as strength 0.
const MAX_LEVELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub numerator: u8,
    /// Note value of the beat: 2, 4, 8, 16...
    pub denominator: u8,
}

impl Default for Meter {
    fn default() -> Self {
        Meter::common_time()
    }
}

impl Meter {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Meter {
            numerator: numerator.max(1),
            denominator: denominator.max(1),
        }
    }

    pub fn common_time() -> Self {
        Meter::new(4, 4)
    }

    /// 6/8, 9/8, 12/8 (and 6/16 ...): beats grouped in threes.
    pub fn is_compound(&self) -> bool {
        self.denominator >= 8 && self.numerator > 3 && self.numerator % 3 == 0
    }

    /// Measure length in ticks at `ppq` ticks per quarter note.
    pub fn measure_ticks(&self, ppq: u16) -> u64 {
        self.numerator as u64 * ppq as u64 * 4 / self.denominator as u64
    }

    /// How each level splits the one above it, top down.
    fn divisions(&self) -> Vec<u64> {
        let mut divs = if self.is_compound() {
            let mut d = prime_factors(self.numerator as u64 / 3);
            d.push(3);
            d
        } else {
            prime_factors(self.numerator as u64)
        };
        while divs.len() < MAX_LEVELS {
            divs.push(2);
        }
        divs
    }

    /// Strength of an onset at `tick` (from the start of the piece).
    pub fn beat_strength_at_tick(&self, tick: u64, ppq: u16) -> f64 {
        let measure = self.measure_ticks(ppq);
        if measure == 0 {
            return 0.0;
        }
        let pos = tick % measure;

        let mut unit_divisor = 1u64;
        let mut strength = 1.0;
        for (level, div) in std::iter::once(1).chain(self.divisions()).enumerate() {
            unit_divisor *= div;
            if level > 0 {
                strength /= 2.0;
            }
            if measure % unit_divisor != 0 {
                break;
            }
            if pos % (measure / unit_divisor) == 0 {
                return strength;
            }
        }
        0.0
    }

    /// Strength of an onset given in quarter notes from the start.
    pub fn beat_strength(&self, offset_quarters: f64) -> f64 {
        const PPQ: u16 = 960;
        let tick = (offset_quarters.max(0.0) * PPQ as f64).round() as u64;
        self.beat_strength_at_tick(tick, PPQ)
    }
}

fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut p = 2;
    while n > 1 && p * p <= n {
        while n % p == 0 {
            factors.push(p);
            n /= p;
        }
        p += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_time_hierarchy() {
        let m = Meter::common_time();
        assert_eq!(m.beat_strength(0.0), 1.0);
        assert_eq!(m.beat_strength(1.0), 0.25);
        assert_eq!(m.beat_strength(2.0), 0.5);
        assert_eq!(m.beat_strength(3.0), 0.25);
        assert_eq!(m.beat_strength(0.5), 0.125);
        assert_eq!(m.beat_strength(0.25), 0.0625);
        // Next measure starts over.
        assert_eq!(m.beat_strength(4.0), 1.0);
    }

    #[test]
    fn test_triple_meter() {
        let m = Meter::new(3, 4);
        assert_eq!(m.beat_strength(0.0), 1.0);
        assert_eq!(m.beat_strength(1.0), 0.5);
        assert_eq!(m.beat_strength(2.0), 0.5);
        assert_eq!(m.beat_strength(1.5), 0.25);
    }

    #[test]
    fn test_compound_meter() {
        let m = Meter::new(6, 8);
        assert!(m.is_compound());
        assert_eq!(m.beat_strength(0.0), 1.0);
        assert_eq!(m.beat_strength(1.5), 0.5);
        assert_eq!(m.beat_strength(0.5), 0.25);
        assert_eq!(m.beat_strength(2.5), 0.25);
    }

    #[test]
    fn test_measure_ticks() {
        assert_eq!(Meter::common_time().measure_ticks(480), 1920);
        assert_eq!(Meter::new(6, 8).measure_ticks(480), 1440);
        assert_eq!(Meter::new(2, 2).measure_ticks(480), 1920);
    }

    #[test]
    fn test_prime_factors() {
        assert_eq!(prime_factors(12), vec![2, 2, 3]);
        assert_eq!(prime_factors(5), vec![5]);
        assert!(prime_factors(1).is_empty());
    }
}
