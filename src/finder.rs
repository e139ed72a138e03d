//! Interaction finders: localizing a minimal faulty interaction from a
//! labeled sample of configurations.
//!
//! An [`InteractionFinder`] owns two growable pools of configurations,
//! split into passing and failing at construction time by running the
//! verifier over the input sample. A search derives a small set of
//! *potential interactions* (literal combinations common to every
//! failure) and narrows it using a configuration-completion oracle and
//! the verifier, spending as few new completions and verifications as
//! possible.
//!
//! Non-localizability is a valid search outcome, not an error: when no
//! configuration can be obtained or no consistent pairing exists, a
//! finder returns an empty literal set instead of failing.
//!
//! A finder is inherently sequential and stateful; every search mutates
//! the configuration pools, so one finder instance must not be shared
//! across concurrent searches.

use log::debug;

use crate::combinations::CombinationSpec;
use crate::literal_set::LiteralSet;
use crate::oracle::{ConfigurationOracle, ConfigurationVerifier};
use crate::variable_map::VariableMap;

/// Cost counters for a finder's external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FinderStatistics {
    /// Number of verifier invocations, including the initial sample split.
    pub verifier_calls: usize,
    /// Number of completion-oracle invocations.
    pub oracle_calls: usize,
    /// Number of configurations the oracle produced.
    pub generated_configurations: usize,
}

/// A configuration together with its verifier classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub configuration: LiteralSet,
    pub passes: bool,
}

/// The strategy used to narrow the potential-interaction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Classify arbitrary fresh configurations until one candidate remains.
    Naive,
    /// Binary splitting, partitioned by a prefix of the candidates' literal union.
    Split,
    /// Binary splitting, partitioned at the median of the maximum literal magnitudes.
    SplitMedian,
}

/// Localizes a minimal faulty interaction within a labeled sample.
pub struct InteractionFinder<O, V> {
    pub(crate) oracle: O,
    pub(crate) verifier: V,
    pub(crate) valid_confs: Vec<LiteralSet>,
    pub(crate) failing_confs: Vec<LiteralSet>,
    pub(crate) core: Option<LiteralSet>,
    pub(crate) stats: FinderStatistics,
}

impl<O, V> InteractionFinder<O, V>
where
    O: ConfigurationOracle,
    V: ConfigurationVerifier,
{
    /// Partitions `sample` into passing and failing pools, eagerly and
    /// once, by running the verifier over every configuration.
    pub fn new(sample: Vec<LiteralSet>, oracle: O, verifier: V) -> Self {
        let mut finder = Self {
            oracle,
            verifier,
            valid_confs: Vec::new(),
            failing_confs: Vec::new(),
            core: None,
            stats: FinderStatistics::default(),
        };
        for configuration in sample {
            finder.classify(configuration);
        }
        debug!(
            "sample split into {} passing and {} failing configurations",
            finder.valid_confs.len(),
            finder.failing_confs.len()
        );
        finder
    }

    /// Marks baseline-forced literals to exclude from candidate
    /// generation; they cannot discriminate failures.
    pub fn with_core(mut self, core: LiteralSet) -> Self {
        self.core = Some(core);
        self
    }

    pub fn valid_configurations(&self) -> &[LiteralSet] {
        &self.valid_confs
    }

    pub fn failing_configurations(&self) -> &[LiteralSet] {
        &self.failing_confs
    }

    pub fn statistics(&self) -> &FinderStatistics {
        &self.stats
    }

    pub(crate) fn verify(&mut self, configuration: &LiteralSet) -> bool {
        self.stats.verifier_calls += 1;
        self.verifier.test(configuration)
    }

    pub(crate) fn complete(&mut self, partial: &LiteralSet) -> Option<LiteralSet> {
        self.stats.oracle_calls += 1;
        let configuration = self.oracle.complete(partial);
        if configuration.is_some() {
            self.stats.generated_configurations += 1;
        }
        configuration
    }

    /// Verifies a configuration and files it into the matching pool.
    pub(crate) fn classify(&mut self, configuration: LiteralSet) -> bool {
        let passes = self.verify(&configuration);
        if passes {
            self.valid_confs.push(configuration);
        } else {
            self.failing_confs.push(configuration);
        }
        passes
    }

    /// Computes the potential-interaction candidates at strength `t`.
    ///
    /// Intersects the literals of all failing configurations (minus the
    /// core, if set). If fewer than `t` literals remain, that whole set
    /// is the single candidate; otherwise every t-subset not contained
    /// in some passing configuration is a candidate.
    ///
    /// An empty failing pool yields no candidates at all: without a
    /// failure sample there is nothing to localize.
    pub fn compute_potential_interactions(&self, t: usize) -> Vec<LiteralSet> {
        assert!(t >= 1, "t must be at least 1, got {}", t);
        if self.failing_confs.is_empty() {
            return Vec::new();
        }
        let mut common = LiteralSet::common_literals(&self.failing_confs);
        if let Some(core) = &self.core {
            common = common.remove_all(core);
        }
        if common.len() < t {
            // Nothing more specific can be derived.
            return vec![common];
        }
        let max_var = common.literals().last().map(|lit| lit.unsigned_abs()).unwrap_or(0);
        let spec = CombinationSpec::literals(
            common.literals().to_vec(),
            t,
            VariableMap::anonymous(max_var as usize),
        );
        let mut candidates = Vec::new();
        spec.for_each(|combination| {
            let candidate = LiteralSet::from_literals(combination.iter().copied());
            // A combination present in a passing configuration cannot,
            // by itself, explain failure.
            if !self.valid_confs.iter().any(|conf| conf.contains_all(&candidate)) {
                candidates.push(candidate);
            }
        });
        debug!("{} potential interactions at t = {}", candidates.len(), t);
        candidates
    }

    /// Narrows the candidate set with the given strategy and returns the
    /// discovered interaction, or an empty set if undecidable.
    pub fn find(&mut self, t: usize, strategy: SearchStrategy) -> LiteralSet {
        match strategy {
            SearchStrategy::Naive => self.find_naive(t),
            SearchStrategy::Split => self.find_split(t),
            SearchStrategy::SplitMedian => self.find_split_median(t),
        }
    }

    /// Naive narrowing: classify arbitrary fresh configurations until a
    /// single candidate remains.
    ///
    /// A passing configuration disproves every candidate it contains; a
    /// failing one keeps only the candidates it contains. If the oracle
    /// cannot produce a configuration, the first remaining candidate is
    /// returned.
    pub fn find_naive(&mut self, t: usize) -> LiteralSet {
        let mut candidates = self.compute_potential_interactions(t);
        while candidates.len() > 1 {
            let Some(configuration) = self.complete(&LiteralSet::new()) else {
                return candidates.remove(0);
            };
            let passes = self.classify(configuration.clone());
            if passes {
                candidates.retain(|candidate| !configuration.contains_all(candidate));
            } else {
                candidates.retain(|candidate| configuration.contains_all(candidate));
            }
            debug!("{} candidates remain after classification", candidates.len());
        }
        candidates.pop().unwrap_or_default()
    }

    /// A configuration containing the union of the given candidates.
    ///
    /// Asks the completion oracle first; only if it fails, searches the
    /// passing and then the failing pool for a containing configuration.
    pub fn get_configuration(&mut self, interactions: &[LiteralSet]) -> Option<LiteralSet> {
        let merged = merge_all(interactions);
        if let Some(configuration) = self.complete(&merged) {
            return Some(configuration);
        }
        find_containing(&self.valid_confs, &merged)
            .or_else(|| find_containing(&self.failing_confs, &merged))
    }

    /// One classified configuration per candidate group, preferring
    /// already-classified configurations over fresh completions.
    ///
    /// The preferred pairing is a failing configuration for `a` and a
    /// passing one for `b`; the symmetric pairing is checked next. Only
    /// then are missing sides completed via the oracle (classifying the
    /// result), with the dispreferred pool as a last resort. Returns
    /// `None` only if a side cannot be obtained at all.
    pub fn get_configurations(
        &mut self,
        a: &[LiteralSet],
        b: &[LiteralSet],
    ) -> Option<(Classified, Classified)> {
        let merged_a = merge_all(a);
        let merged_b = merge_all(b);

        let failing_a = find_containing(&self.failing_confs, &merged_a);
        let valid_b = find_containing(&self.valid_confs, &merged_b);
        if let (Some(fa), Some(vb)) = (&failing_a, &valid_b) {
            return Some((
                Classified { configuration: fa.clone(), passes: false },
                Classified { configuration: vb.clone(), passes: true },
            ));
        }
        let valid_a = find_containing(&self.valid_confs, &merged_a);
        let failing_b = find_containing(&self.failing_confs, &merged_b);
        if let (Some(va), Some(fb)) = (&valid_a, &failing_b) {
            return Some((
                Classified { configuration: va.clone(), passes: true },
                Classified { configuration: fb.clone(), passes: false },
            ));
        }

        let side_a = self.assemble_side(
            &merged_a,
            failing_a.map(|configuration| Classified { configuration, passes: false }),
            valid_a.map(|configuration| Classified { configuration, passes: true }),
        )?;
        let side_b = self.assemble_side(
            &merged_b,
            valid_b.map(|configuration| Classified { configuration, passes: true }),
            failing_b.map(|configuration| Classified { configuration, passes: false }),
        )?;
        Some((side_a, side_b))
    }

    fn assemble_side(
        &mut self,
        merged: &LiteralSet,
        preferred: Option<Classified>,
        fallback: Option<Classified>,
    ) -> Option<Classified> {
        if preferred.is_some() {
            return preferred;
        }
        if let Some(configuration) = self.complete(merged) {
            let passes = self.classify(configuration.clone());
            return Some(Classified { configuration, passes });
        }
        fallback
    }
}

/// Union of all given literal sets.
pub(crate) fn merge_all(sets: &[LiteralSet]) -> LiteralSet {
    sets.iter().fold(LiteralSet::new(), |acc, set| acc.merge(set))
}

pub(crate) fn find_containing(pool: &[LiteralSet], merged: &LiteralSet) -> Option<LiteralSet> {
    pool.iter().find(|conf| conf.contains_all(merged)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn set(lits: impl IntoIterator<Item = i32>) -> LiteralSet {
        LiteralSet::from_literals(lits)
    }

    /// Fails whenever variables 1 and 2 are both set positively.
    fn pair_verifier(conf: &LiteralSet) -> bool {
        !(conf.contains_literal(1) && conf.contains_literal(2))
    }

    /// Completes a partial assignment by setting every missing variable
    /// of `1..=n` to false.
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
    fn test_sample_is_partitioned_once() {
        let sample = vec![set([1, 2, 3, -4]), set([1, -2, 3, 4]), set([1, 2, -3, 4])];
        let finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert_eq!(finder.failing_configurations().len(), 2);
        assert_eq!(finder.valid_configurations().len(), 1);
        assert_eq!(finder.statistics().verifier_calls, 3);
        assert_eq!(finder.statistics().oracle_calls, 0);
    }

    #[test]
    fn test_localizes_pair_interaction() {
        // Every failure contains 1 and 2 together; passing configurations
        // contain one of them but never both.
        let sample = vec![
            set([1, 2, 3, -4]),
            set([1, 2, -3, 4]),
            set([1, -2, 3, 4]),
            set([-1, 2, 3, 4]),
        ];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert_eq!(finder.compute_potential_interactions(2), vec![set([1, 2])]);
        for strategy in [SearchStrategy::Naive, SearchStrategy::Split, SearchStrategy::SplitMedian] {
            assert_eq!(finder.find(2, strategy), set([1, 2]), "{:?}", strategy);
        }
        // A single candidate never needs the oracle.
        assert_eq!(finder.statistics().oracle_calls, 0);
        assert_eq!(finder.statistics().verifier_calls, 4);
    }

    #[test]
    fn test_potential_interactions_filter_by_passing() {
        // Failing configurations share {1, 2, 3}; the passing one
        // disproves {1, 3}.
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4]), set([1, -2, 3, 4])];
        let finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        let candidates = finder.compute_potential_interactions(2);
        assert_eq!(candidates, vec![set([1, 2]), set([2, 3])]);
    }

    #[test]
    fn test_degenerate_common_below_t() {
        let sample = vec![set([1, 2, -3]), set([1, 2, 3])];
        let finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        // Only {1, 2} is common, which is below t = 3.
        assert_eq!(finder.compute_potential_interactions(3), vec![set([1, 2])]);
    }

    #[test]
    fn test_empty_failing_pool_yields_nothing() {
        let sample = vec![set([1, -2, 3]), set([-1, 2, 3])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert!(finder.failing_configurations().is_empty());
        assert!(finder.compute_potential_interactions(2).is_empty());
        for strategy in [SearchStrategy::Naive, SearchStrategy::Split, SearchStrategy::SplitMedian] {
            assert!(finder.find(2, strategy).is_empty());
        }
        assert_eq!(finder.statistics().oracle_calls, 0);
    }

    #[test]
    fn test_core_literals_are_excluded() {
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4])];
        let finder = InteractionFinder::new(sample, no_oracle, pair_verifier).with_core(set([3]));
        assert_eq!(finder.compute_potential_interactions(2), vec![set([1, 2])]);
    }

    #[test]
    fn test_naive_narrows_with_generated_configurations() {
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4]), set([1, -2, 3, 4])];
        let canned = vec![set([-1, 2, 3, 4])];
        let mut served = 0;
        let oracle = move |partial: &LiteralSet| -> Option<LiteralSet> {
            assert!(partial.is_empty());
            let configuration = canned.get(served).cloned();
            served += 1;
            configuration
        };
        let mut finder = InteractionFinder::new(sample, oracle, pair_verifier);
        // Candidates start as {1, 2} and {2, 3}; the generated passing
        // configuration contains {2, 3} and disproves it.
        assert_eq!(finder.find_naive(2), set([1, 2]));
        assert_eq!(finder.statistics().oracle_calls, 1);
        assert_eq!(finder.statistics().generated_configurations, 1);
        assert_eq!(finder.statistics().verifier_calls, 3 + 1);
    }

    #[test]
    fn test_naive_returns_first_candidate_when_oracle_dries_up() {
        let sample = vec![set([1, 2, 3, 4]), set([1, 2, 3, -4]), set([1, -2, 3, 4])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert_eq!(finder.find_naive(2), set([1, 2]));
        assert_eq!(finder.statistics().oracle_calls, 1);
        assert_eq!(finder.statistics().generated_configurations, 0);
    }

    #[test]
    fn test_get_configuration_falls_back_to_pools() {
        let sample = vec![set([1, 2, 3]), set([1, -2, 3])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert_eq!(finder.get_configuration(&[set([1, 2])]), Some(set([1, 2, 3])));
        assert_eq!(finder.get_configuration(&[set([1])]), Some(set([1, -2, 3])));
        assert_eq!(finder.get_configuration(&[set([-3])]), None);
    }

    #[test]
    fn test_get_configurations_reuses_classified_pair() {
        let sample = vec![set([1, 2, 3, 4]), set([-1, 2, 3, 4])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        let (side_a, side_b) = finder
            .get_configurations(&[set([1, 2])], &[set([2, 3])])
            .unwrap();
        assert!(!side_a.passes);
        assert_eq!(side_a.configuration, set([1, 2, 3, 4]));
        assert!(side_b.passes);
        assert_eq!(side_b.configuration, set([-1, 2, 3, 4]));
        // Both sides came from the pools.
        assert_eq!(finder.statistics().oracle_calls, 0);
    }

    #[test]
    fn test_get_configurations_completes_missing_side() {
        let sample = vec![set([1, 2, 3, 4]), set([1, -2, 3, 4])];
        let mut finder = InteractionFinder::new(sample, complete_negative(4), pair_verifier);
        let (side_a, side_b) = finder
            .get_configurations(&[set([1, 2])], &[set([2, 3])])
            .unwrap();
        assert!(!side_a.passes);
        assert_eq!(side_a.configuration, set([1, 2, 3, 4]));
        // The oracle completed {2, 3} negatively elsewhere, which passes.
        assert!(side_b.passes);
        assert_eq!(side_b.configuration, set([-1, 2, 3, -4]));
        assert_eq!(finder.statistics().oracle_calls, 1);
        // The fresh configuration joined the passing pool.
        assert_eq!(finder.valid_configurations().len(), 2);
    }

    #[test]
    fn test_get_configurations_unobtainable() {
        let sample = vec![set([1, 2, 3])];
        let mut finder = InteractionFinder::new(sample, no_oracle, pair_verifier);
        assert!(finder.get_configurations(&[set([-1])], &[set([1, 2])]).is_none());
    }
}
