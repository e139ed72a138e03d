//! Strength-sweep search: reconciling interactions found at every
//! strength from 1 up to a maximum.
//!
//! A search at a single strength can settle on an interaction that is
//! too small (a fragment of the real one) or too large (carrying
//! literals that do not matter). Sweeping all strengths and probing the
//! difference between nested results separates the two cases with one
//! extra completion.

use log::debug;

use crate::finder::{InteractionFinder, SearchStrategy};
use crate::literal_set::LiteralSet;
use crate::oracle::{ConfigurationOracle, ConfigurationVerifier};

impl<O, V> InteractionFinder<O, V>
where
    O: ConfigurationOracle,
    V: ConfigurationVerifier,
{
    /// Runs `strategy` for every strength in `1..=max_t` and reconciles
    /// the results from the largest strength downward.
    ///
    /// When a larger result properly contains a smaller one, the extra
    /// literals are probed: a configuration forcing the smaller result
    /// with the extras negated is completed and verified. A reproduced
    /// failure shows the extras are not part of the minimal interaction
    /// (the smaller result is preferred); a pass shows they are (the
    /// larger result is preferred). One confirming search is then re-run
    /// at the preferred strength. Without any containment among the
    /// results, the first non-empty result is returned unchanged.
    pub fn find_sweep(&mut self, max_t: usize, strategy: SearchStrategy) -> LiteralSet {
        assert!(max_t >= 1, "t must be at least 1, got {}", max_t);
        let results: Vec<LiteralSet> = (1..=max_t).map(|t| self.find(t, strategy)).collect();

        let mut preferred: Option<(usize, LiteralSet)> = None;
        for t in (2..=max_t).rev() {
            let larger = &results[t - 1];
            let smaller = &results[t - 2];
            if !properly_contains(larger, smaller) {
                continue;
            }
            let extras = larger.remove_all(smaller);
            let probe = smaller.merge(&extras.negate());
            debug!("probing whether {} still fails without {}", smaller, extras);
            let verdict = match self.complete(&probe) {
                Some(configuration) => Some(self.classify(configuration)),
                None => None,
            };
            preferred = match verdict {
                // Failure reproduced without the extras.
                Some(false) => Some((t - 1, smaller.clone())),
                _ => Some((t, larger.clone())),
            };
            break;
        }

        match preferred {
            Some((t, result)) => {
                debug!("re-running the search at t = {}", t);
                let confirmed = self.find(t, strategy);
                if confirmed.is_empty() {
                    result
                } else {
                    confirmed
                }
            }
            None => results.into_iter().find(|r| !r.is_empty()).unwrap_or_default(),
        }
    }
}

fn properly_contains(larger: &LiteralSet, smaller: &LiteralSet) -> bool {
    !smaller.is_empty() && larger.len() > smaller.len() && larger.contains_all(smaller)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn set(lits: impl IntoIterator<Item = i32>) -> LiteralSet {
        LiteralSet::from_literals(lits)
    }

    fn pair_verifier(conf: &LiteralSet) -> bool {
        !(conf.contains_literal(1) && conf.contains_literal(2))
    }

    fn complete_negative(n: i32) -> impl FnMut(&LiteralSet) -> Option<LiteralSet> {
        move |partial: &LiteralSet| {
            let literals = (1..=n).map(|var| partial.literal_of_variable(var as u32).unwrap_or(-var));
            Some(LiteralSet::from_literals(literals))
        }
    }

    fn no_oracle(_: &LiteralSet) -> Option<LiteralSet> {
        None
    }

    #[test]
    fn test_sweep_grows_an_undersized_result() {
        // At t = 1 the search settles on {2}, a fragment of the real
        // interaction {1, 2}. The sweep probes {-1, 2}, sees the failure
        // vanish, and prefers the larger result.
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4]), set([1, -2, 3, 4])];
        let mut finder = InteractionFinder::new(sample, complete_negative(4), pair_verifier);
        assert_eq!(finder.find(1, SearchStrategy::Split), set([2]));
        assert_eq!(finder.find_sweep(2, SearchStrategy::Split), set([1, 2]));
    }

    #[test]
    fn test_sweep_falls_back_to_first_nonempty() {
        // The t = 1 result is empty (every single literal also occurs in
        // a passing configuration), so no containment exists and the
        // t = 2 result is returned unchanged.
        let sample = vec![
            set([1, 2, 3, -4]),
            set([1, 2, -3, 4]),
            set([1, -2, 3, 4]),
            set([-1, 2, 3, 4]),
        ];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert!(finder.find(1, SearchStrategy::Split).is_empty());
        assert_eq!(finder.find_sweep(2, SearchStrategy::Split), set([1, 2]));
        assert_eq!(finder.statistics().oracle_calls, 0);
    }

    #[test]
    fn test_sweep_with_empty_sample_is_empty() {
        let sample = vec![set([1, -2, 3])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert!(finder.find_sweep(3, SearchStrategy::SplitMedian).is_empty());
    }
}
