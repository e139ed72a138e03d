//! Binary-splitting narrowing strategies.
//!
//! Both strategies repeatedly partition the candidate set into two
//! groups, obtain one classified configuration per group, and recurse
//! into whichever group the classifications incriminate. They differ
//! only in the partition heuristic.

use log::{debug, warn};

use crate::finder::{merge_all, InteractionFinder};
use crate::literal_set::LiteralSet;
use crate::oracle::{ConfigurationOracle, ConfigurationVerifier};

/// Upper bound on narrowing rounds.
///
/// The both-fail branch restricts the candidate set by intersection and
/// is not guaranteed to shrink it; hitting the bound reports the search
/// as undecidable instead of looping forever.
const MAX_SPLIT_ROUNDS: usize = 64;

impl<O, V> InteractionFinder<O, V>
where
    O: ConfigurationOracle,
    V: ConfigurationVerifier,
{
    /// Binary-splitting search, partitioned by a ~70% prefix of the
    /// union of all candidates' literals.
    pub fn find_split(&mut self, t: usize) -> LiteralSet {
        self.split_search(t, partition_by_union_prefix)
    }

    /// Binary-splitting search, partitioned at the median of the
    /// candidates' maximum literal magnitudes.
    pub fn find_split_median(&mut self, t: usize) -> LiteralSet {
        self.split_search(t, partition_by_median_magnitude)
    }

    fn split_search(
        &mut self,
        t: usize,
        partition: fn(&[LiteralSet]) -> (Vec<LiteralSet>, Vec<LiteralSet>),
    ) -> LiteralSet {
        let mut candidates = self.compute_potential_interactions(t);
        let mut rounds = 0;
        while candidates.len() > 1 {
            rounds += 1;
            if rounds > MAX_SPLIT_ROUNDS {
                warn!("split search did not converge after {} rounds, giving up", MAX_SPLIT_ROUNDS);
                return LiteralSet::new();
            }
            let (left, right) = partition(&candidates);
            debug!(
                "splitting {} candidates into {} / {}",
                candidates.len(),
                left.len(),
                right.len()
            );
            let Some((side_a, side_b)) = self.get_configurations(&left, &right) else {
                return LiteralSet::new();
            };
            match (side_a.passes, side_b.passes) {
                (false, true) => candidates = left,
                (true, false) => candidates = right,
                (false, false) => {
                    // Keep only candidates present in both failures.
                    candidates.retain(|candidate| {
                        side_a.configuration.contains_all(candidate)
                            && side_b.configuration.contains_all(candidate)
                    });
                }
                (true, true) => {
                    // Both groups are covered by passing configurations.
                    candidates.retain(|candidate| {
                        !side_a.configuration.contains_all(candidate)
                            && !side_b.configuration.contains_all(candidate)
                    });
                }
            }
        }
        candidates.pop().unwrap_or_default()
    }
}

fn split_by_containment(
    candidates: &[LiteralSet],
    within: &LiteralSet,
) -> (Vec<LiteralSet>, Vec<LiteralSet>) {
    candidates
        .iter()
        .cloned()
        .partition(|candidate| within.contains_all(candidate))
}

/// Partitions by containment in the first ~70% of the union of all
/// candidates' literals, falling back to the first candidate's own
/// literals if either side comes up empty.
fn partition_by_union_prefix(candidates: &[LiteralSet]) -> (Vec<LiteralSet>, Vec<LiteralSet>) {
    let union = merge_all(candidates);
    let cut = (union.len() * 7 + 9) / 10;
    let prefix = LiteralSet::from_literals(union.literals()[..cut].iter().copied());
    let (left, right) = split_by_containment(candidates, &prefix);
    if left.is_empty() || right.is_empty() {
        let first = candidates[0].clone();
        return split_by_containment(candidates, &first);
    }
    (left, right)
}

fn max_magnitude(set: &LiteralSet) -> u32 {
    // Literal sets are ordered by variable, so the last one is maximal.
    set.literals().last().map(|lit| lit.unsigned_abs()).unwrap_or(0)
}

/// Sorts by maximum literal magnitude and divides at the median index,
/// extending the boundary so candidates sharing the same maximum
/// magnitude stay together.
fn partition_by_median_magnitude(candidates: &[LiteralSet]) -> (Vec<LiteralSet>, Vec<LiteralSet>) {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(max_magnitude);
    let mut mid = sorted.len() / 2;
    while mid < sorted.len() && max_magnitude(&sorted[mid]) == max_magnitude(&sorted[mid - 1]) {
        mid += 1;
    }
    if mid == sorted.len() {
        // The upper half is one magnitude class; extend downward instead.
        mid = sorted.len() / 2;
        while mid > 0 && max_magnitude(&sorted[mid]) == max_magnitude(&sorted[mid - 1]) {
            mid -= 1;
        }
        if mid == 0 {
            mid = sorted.len() / 2;
        }
    }
    let right = sorted.split_off(mid);
    (sorted, right)
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
    fn test_partition_by_union_prefix() {
        // The prefix {1, 2, 9} separates the two candidates.
        let candidates = vec![set([1, 2]), set([9, 10])];
        let (left, right) = partition_by_union_prefix(&candidates);
        assert_eq!(left, vec![set([1, 2])]);
        assert_eq!(right, vec![set([9, 10])]);
    }

    #[test]
    fn test_partition_by_union_prefix_fallback() {
        // The 70% prefix of {1, 2, 3} is the whole union, so the first
        // candidate's literals decide the split.
        let candidates = vec![set([1, 2]), set([1, 3]), set([2, 3])];
        let (left, right) = partition_by_union_prefix(&candidates);
        assert_eq!(left, vec![set([1, 2])]);
        assert_eq!(right, vec![set([1, 3]), set([2, 3])]);
    }

    #[test]
    fn test_partition_by_median_magnitude() {
        let candidates = vec![set([1, 2]), set([1, 3]), set([2, 3])];
        let (left, right) = partition_by_median_magnitude(&candidates);
        assert_eq!(left, vec![set([1, 2])]);
        assert_eq!(right, vec![set([1, 3]), set([2, 3])]);
    }

    #[test]
    fn test_partition_by_median_magnitude_ties() {
        // All candidates share the maximum magnitude; the split falls
        // back to the raw median index.
        let candidates = vec![set([1, 3]), set([2, 3])];
        let (left, right) = partition_by_median_magnitude(&candidates);
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn test_split_localizes_with_oracle() {
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4]), set([1, -2, 3, 4])];
        let mut finder = InteractionFinder::new(sample, complete_negative(4), pair_verifier);
        // Candidates {1, 2} and {2, 3}: the left side is found failing in
        // the pool, the right side is completed, passes, and is disproved.
        assert_eq!(finder.find_split(2), set([1, 2]));
        assert_eq!(finder.statistics().oracle_calls, 1);
    }

    #[test]
    fn test_split_median_localizes_with_oracle() {
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4]), set([1, -2, 3, 4])];
        let mut finder = InteractionFinder::new(sample, complete_negative(4), pair_verifier);
        assert_eq!(finder.find_split_median(2), set([1, 2]));
    }

    #[test]
    fn test_split_reports_undecidable_without_progress() {
        // No passing configurations and a dead oracle: both sides keep
        // resolving to the same failing configuration, the candidate set
        // never shrinks, and the round bound converts the loop into an
        // undecidable result.
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert_eq!(finder.compute_potential_interactions(2).len(), 3);
        assert!(finder.find_split(2).is_empty());
    }
}
