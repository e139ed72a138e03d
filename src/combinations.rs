//! Combination specifications: descriptions of a combinatorial universe
//! and the enumeration of its t-wise combinations.
//!
//! A [`CombinationSpec`] holds one or more groups of elements together
//! with a strength `t` per group and enumerates every t-wise combination,
//! sequentially or in parallel. Variable-based variants additionally vary
//! the sign of every chosen literal, walking the sign assignments in
//! Gray-code order so that two consecutive combinations differ in exactly
//! one literal.
//!
//! # Example
//!
//! ```
//! use cit_rs::combinations::CombinationSpec;
//! use cit_rs::variable_map::VariableMap;
//!
//! let map = VariableMap::anonymous(2);
//! let spec = CombinationSpec::variables(vec![1, 2], 1, map);
//! assert_eq!(spec.loop_count(), 4);
//!
//! let mut seen = Vec::new();
//! spec.for_each(|combination| seen.push(combination.to_vec()));
//! assert_eq!(seen, vec![vec![1], vec![-1], vec![2], vec![-2]]);
//! ```
//!
//! The combination slice passed to a consumer is owned by the traversal
//! and reused between callbacks; copy it if you need to keep it.
//! Traversals always run to completion; a caller needing early
//! termination must unwind out of the consumer.

use std::slice;

use log::debug;
use num_bigint::BigUint;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::literal_set::LiteralSet;
use crate::subsets::{unrank_subset, GraySigns, SubsetIter};
use crate::utils::{
    binomial, binomial_exact, checked_pow2, pow2_exact, saturating_count_add, saturating_count_mul,
};
use crate::variable_map::VariableMap;

/// One `(elements, t)` group of a combination universe.
///
/// An empty element array means "not yet set"; [`CombinationSpec::adapt`]
/// initializes such a group from all variables of the new map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    elements: Vec<i32>,
    t: usize,
}

impl Group {
    /// # Panics
    ///
    /// Panics if `t < 1`, if `t` exceeds the number of elements of a
    /// non-empty group, or if the elements are not distinct.
    pub fn new(elements: Vec<i32>, t: usize) -> Self {
        assert!(t >= 1, "t must be at least 1, got {}", t);
        if !elements.is_empty() {
            assert!(
                t <= elements.len(),
                "t = {} exceeds the {} available elements",
                t,
                elements.len()
            );
        }
        let mut sorted = elements.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), elements.len(), "group elements must be distinct");
        Self { elements, t }
    }

    pub fn elements(&self) -> &[i32] {
        &self.elements
    }

    pub fn t(&self) -> usize {
        self.t
    }

    fn subset_count(&self) -> u64 {
        binomial(self.elements.len() as u64, self.t as u64)
    }
}

/// A combinatorial universe and the strength of its combinations.
///
/// The closed set of variants covers single-group and multi-group
/// universes over literals (sign baked into the elements) or variables
/// (sign varied during enumeration), pre-materialized combination lists,
/// and heterogeneous composites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombinationSpec {
    /// A single group of signed literals; plain lexicographic t-subsets.
    Literals { group: Group, map: VariableMap },
    /// A single group of variables; every t-subset is expanded through
    /// all sign assignments in Gray-code order.
    Variables { group: Group, map: VariableMap },
    /// Independent literal groups; the cross-product of their subsets.
    LiteralSets { groups: Vec<Group>, map: VariableMap },
    /// Independent variable groups, sign-expanded like `Variables`.
    VariableSets { groups: Vec<Group>, map: VariableMap },
    /// A pre-materialized list of combinations; no generation.
    Predefined { list: Vec<LiteralSet>, map: VariableMap },
    /// Heterogeneous child specifications treated as one universe.
    Multi(Vec<CombinationSpec>),
}

impl CombinationSpec {
    /// Single group of signed literals.
    pub fn literals(elements: Vec<i32>, t: usize, map: VariableMap) -> Self {
        for &element in &elements {
            assert_ne!(element, 0, "literal 0 does not reference a variable");
        }
        CombinationSpec::Literals {
            group: Group::new(elements, t),
            map,
        }
    }

    /// Single group of variable indices.
    pub fn variables(elements: Vec<i32>, t: usize, map: VariableMap) -> Self {
        for &element in &elements {
            assert!(element > 0, "variable indices must be positive, got {}", element);
        }
        CombinationSpec::Variables {
            group: Group::new(elements, t),
            map,
        }
    }

    /// Independent literal groups, each with its own strength.
    pub fn literal_sets(groups: Vec<(Vec<i32>, usize)>, map: VariableMap) -> Self {
        assert!(!groups.is_empty(), "at least one group is required");
        let groups = groups
            .into_iter()
            .map(|(elements, t)| {
                for &element in &elements {
                    assert_ne!(element, 0, "literal 0 does not reference a variable");
                }
                Group::new(elements, t)
            })
            .collect();
        CombinationSpec::LiteralSets { groups, map }
    }

    /// Independent variable groups, each with its own strength.
    pub fn variable_sets(groups: Vec<(Vec<i32>, usize)>, map: VariableMap) -> Self {
        assert!(!groups.is_empty(), "at least one group is required");
        let groups = groups
            .into_iter()
            .map(|(elements, t)| {
                for &element in &elements {
                    assert!(element > 0, "variable indices must be positive, got {}", element);
                }
                Group::new(elements, t)
            })
            .collect();
        CombinationSpec::VariableSets { groups, map }
    }

    /// Wraps an already-materialized combination list.
    pub fn predefined(list: Vec<LiteralSet>, map: VariableMap) -> Self {
        CombinationSpec::Predefined { list, map }
    }

    /// Composite over heterogeneous child specifications.
    pub fn multi(children: Vec<CombinationSpec>) -> Self {
        CombinationSpec::Multi(children)
    }

    /// The exact number of combinations as a saturating 64-bit count.
    ///
    /// On arithmetic overflow a warning is logged and `u64::MAX` is
    /// returned, so callers can still make scheduling decisions.
    pub fn loop_count(&self) -> u64 {
        match self {
            CombinationSpec::Literals { group, .. } => grouped_count(slice::from_ref(group), false),
            CombinationSpec::Variables { group, .. } => grouped_count(slice::from_ref(group), true),
            CombinationSpec::LiteralSets { groups, .. } => grouped_count(groups, false),
            CombinationSpec::VariableSets { groups, .. } => grouped_count(groups, true),
            CombinationSpec::Predefined { list, .. } => list.len() as u64,
            CombinationSpec::Multi(children) => children
                .iter()
                .fold(0, |acc, child| saturating_count_add(acc, child.loop_count())),
        }
    }

    /// The exact number of combinations, without any saturation.
    pub fn loop_count_exact(&self) -> BigUint {
        match self {
            CombinationSpec::Literals { group, .. } => grouped_count_exact(slice::from_ref(group), false),
            CombinationSpec::Variables { group, .. } => grouped_count_exact(slice::from_ref(group), true),
            CombinationSpec::LiteralSets { groups, .. } => grouped_count_exact(groups, false),
            CombinationSpec::VariableSets { groups, .. } => grouped_count_exact(groups, true),
            CombinationSpec::Predefined { list, .. } => BigUint::from(list.len()),
            CombinationSpec::Multi(children) => children
                .iter()
                .map(CombinationSpec::loop_count_exact)
                .sum(),
        }
    }

    /// Shuffles every group's elements in place.
    ///
    /// One sub-generator is derived from `seed` per group in order, so
    /// repeated calls with the same seed reproduce the same order across
    /// all groups. For predefined lists the list order is shuffled.
    pub fn shuffle_elements(&mut self, seed: u64) {
        let mut master = ChaCha8Rng::seed_from_u64(seed);
        self.shuffle_with(&mut master);
    }

    fn shuffle_with(&mut self, master: &mut ChaCha8Rng) {
        match self {
            CombinationSpec::Literals { group, .. } | CombinationSpec::Variables { group, .. } => {
                shuffle_group(group, master);
            }
            CombinationSpec::LiteralSets { groups, .. }
            | CombinationSpec::VariableSets { groups, .. } => {
                for group in groups.iter_mut() {
                    shuffle_group(group, master);
                }
            }
            CombinationSpec::Predefined { list, .. } => {
                let mut sub = ChaCha8Rng::seed_from_u64(master.next_u64());
                list.shuffle(&mut sub);
            }
            CombinationSpec::Multi(children) => {
                for child in children.iter_mut() {
                    child.shuffle_with(master);
                }
            }
        }
    }

    /// Renumbers all elements from the current variable map to `new_map`.
    ///
    /// Groups whose elements were never set are initialized from all
    /// variables of the new map.
    ///
    /// # Panics
    ///
    /// Panics if an element's variable has no counterpart in `new_map`.
    pub fn adapt(&mut self, new_map: &VariableMap) {
        match self {
            CombinationSpec::Literals { group, map } | CombinationSpec::Variables { group, map } => {
                adapt_group(group, map, new_map);
                *map = new_map.clone();
            }
            CombinationSpec::LiteralSets { groups, map }
            | CombinationSpec::VariableSets { groups, map } => {
                for group in groups.iter_mut() {
                    adapt_group(group, map, new_map);
                }
                *map = new_map.clone();
            }
            CombinationSpec::Predefined { list, map } => {
                for set in list.iter_mut() {
                    set.adapt(map, new_map, true);
                }
                *map = new_map.clone();
            }
            CombinationSpec::Multi(children) => {
                for child in children.iter_mut() {
                    child.adapt(new_map);
                }
            }
        }
    }

    /// A new, independent specification whose strength never exceeds
    /// `new_t`. Strengths are only ever reduced, and predefined entries
    /// larger than `new_t` are dropped.
    pub fn reduce_t_to(&self, new_t: usize) -> CombinationSpec {
        assert!(new_t >= 1, "t must be at least 1, got {}", new_t);
        match self {
            CombinationSpec::Literals { group, map } => CombinationSpec::Literals {
                group: reduce_group(group, new_t),
                map: map.clone(),
            },
            CombinationSpec::Variables { group, map } => CombinationSpec::Variables {
                group: reduce_group(group, new_t),
                map: map.clone(),
            },
            CombinationSpec::LiteralSets { groups, map } => CombinationSpec::LiteralSets {
                groups: groups.iter().map(|g| reduce_group(g, new_t)).collect(),
                map: map.clone(),
            },
            CombinationSpec::VariableSets { groups, map } => CombinationSpec::VariableSets {
                groups: groups.iter().map(|g| reduce_group(g, new_t)).collect(),
                map: map.clone(),
            },
            CombinationSpec::Predefined { list, map } => CombinationSpec::Predefined {
                list: list.iter().filter(|set| set.len() <= new_t).cloned().collect(),
                map: map.clone(),
            },
            CombinationSpec::Multi(children) => {
                CombinationSpec::Multi(children.iter().map(|c| c.reduce_t_to(new_t)).collect())
            }
        }
    }

    /// The largest strength among all groups.
    pub fn max_t(&self) -> usize {
        match self {
            CombinationSpec::Literals { group, .. } | CombinationSpec::Variables { group, .. } => group.t,
            CombinationSpec::LiteralSets { groups, .. }
            | CombinationSpec::VariableSets { groups, .. } => {
                groups.iter().map(|g| g.t).max().unwrap_or(0)
            }
            CombinationSpec::Predefined { list, .. } => list.iter().map(LiteralSet::len).max().unwrap_or(0),
            CombinationSpec::Multi(children) => children.iter().map(CombinationSpec::max_t).max().unwrap_or(0),
        }
    }

    /// The associated variable map; for composites, a merged view.
    pub fn variable_map(&self) -> VariableMap {
        match self {
            CombinationSpec::Literals { map, .. }
            | CombinationSpec::Variables { map, .. }
            | CombinationSpec::LiteralSets { map, .. }
            | CombinationSpec::VariableSets { map, .. }
            | CombinationSpec::Predefined { map, .. } => map.clone(),
            CombinationSpec::Multi(children) => {
                let maps: Vec<VariableMap> = children.iter().map(CombinationSpec::variable_map).collect();
                VariableMap::merge(&maps)
            }
        }
    }

    /// Invokes `consumer` for every combination, sequentially.
    pub fn for_each<F>(&self, mut consumer: F)
    where
        F: FnMut(&[i32]),
    {
        self.for_each_with(|| (), |_: &mut (), combination| consumer(combination));
    }

    /// Sequential traversal with a caller-supplied environment.
    ///
    /// The factory is invoked once; the environment is reused across all
    /// combinations of the traversal.
    pub fn for_each_with<E, G, F>(&self, env_factory: G, mut consumer: F)
    where
        G: FnOnce() -> E,
        F: FnMut(&mut E, &[i32]),
    {
        let mut env = env_factory();
        self.walk(&mut env, &mut consumer);
    }

    fn walk<E, F>(&self, env: &mut E, consumer: &mut F)
    where
        F: FnMut(&mut E, &[i32]),
    {
        match self {
            CombinationSpec::Literals { group, .. } => {
                walk_groups(slice::from_ref(group), false, env, consumer)
            }
            CombinationSpec::Variables { group, .. } => {
                walk_groups(slice::from_ref(group), true, env, consumer)
            }
            CombinationSpec::LiteralSets { groups, .. } => walk_groups(groups, false, env, consumer),
            CombinationSpec::VariableSets { groups, .. } => walk_groups(groups, true, env, consumer),
            CombinationSpec::Predefined { list, .. } => {
                for set in list {
                    consumer(env, set.literals());
                }
            }
            CombinationSpec::Multi(children) => {
                for child in children {
                    child.walk(env, consumer);
                }
            }
        }
    }

    /// Unordered parallel traversal over the rayon pool.
    pub fn par_for_each<F>(&self, consumer: F)
    where
        F: Fn(&[i32]) + Sync + Send,
    {
        self.par_for_each_with(|| (), |_: &mut (), combination| consumer(combination));
    }

    /// Parallel traversal with one environment per worker.
    ///
    /// The factory is invoked once per worker and the environment reused
    /// across all combinations that worker processes. Combinations are
    /// delivered unordered; consumers must be re-entrant with respect to
    /// any shared state.
    pub fn par_for_each_with<E, G, F>(&self, env_factory: G, consumer: F)
    where
        E: Send,
        G: Fn() -> E + Sync + Send,
        F: Fn(&mut E, &[i32]) + Sync + Send,
    {
        self.par_walk(&env_factory, &consumer);
    }

    fn par_walk<E, G, F>(&self, env_factory: &G, consumer: &F)
    where
        E: Send,
        G: Fn() -> E + Sync + Send,
        F: Fn(&mut E, &[i32]) + Sync + Send,
    {
        match self {
            CombinationSpec::Literals { group, .. } => {
                par_walk_groups(slice::from_ref(group), false, env_factory, consumer)
            }
            CombinationSpec::Variables { group, .. } => {
                par_walk_groups(slice::from_ref(group), true, env_factory, consumer)
            }
            CombinationSpec::LiteralSets { groups, .. } => {
                par_walk_groups(groups, false, env_factory, consumer)
            }
            CombinationSpec::VariableSets { groups, .. } => {
                par_walk_groups(groups, true, env_factory, consumer)
            }
            CombinationSpec::Predefined { list, .. } => {
                list.par_iter()
                    .for_each_init(env_factory, |env, set| consumer(env, set.literals()));
            }
            CombinationSpec::Multi(children) => {
                for child in children {
                    child.par_walk(env_factory, consumer);
                }
            }
        }
    }
}

fn grouped_count(groups: &[Group], signed: bool) -> u64 {
    groups.iter().fold(1u64, |acc, group| {
        let mut per_group = group.subset_count();
        if signed {
            per_group = match checked_pow2(group.t) {
                Some(signs) => saturating_count_mul(per_group, signs),
                None => {
                    log::warn!("2^{} does not fit into u64, saturating", group.t);
                    u64::MAX
                }
            };
        }
        saturating_count_mul(acc, per_group)
    })
}

fn grouped_count_exact(groups: &[Group], signed: bool) -> BigUint {
    groups.iter().fold(BigUint::from(1u32), |acc, group| {
        let mut per_group = binomial_exact(group.elements.len() as u64, group.t as u64);
        if signed {
            per_group *= pow2_exact(group.t);
        }
        acc * per_group
    })
}

fn shuffle_group(group: &mut Group, master: &mut ChaCha8Rng) {
    let mut sub = ChaCha8Rng::seed_from_u64(master.next_u64());
    group.elements.shuffle(&mut sub);
}

fn adapt_group(group: &mut Group, old: &VariableMap, new: &VariableMap) {
    if group.elements.is_empty() {
        debug!("initializing group elements from all {} variables of the new map", new.size());
        group.elements = new.variables();
    } else {
        old.adapt_literals(&mut group.elements, new, true);
    }
    assert!(
        group.t <= group.elements.len(),
        "t = {} exceeds the {} elements after adaptation",
        group.t,
        group.elements.len()
    );
}

fn reduce_group(group: &Group, new_t: usize) -> Group {
    Group {
        elements: group.elements.clone(),
        t: group.t.min(new_t),
    }
}

/// Enumeration state of a single group: its subset iterator plus the
/// Gray-code sign sequence (trivial for unsigned groups).
struct GroupCursor<'a> {
    elements: &'a [i32],
    iter: SubsetIter,
    gray: GraySigns,
}

impl<'a> GroupCursor<'a> {
    fn new(group: &'a Group, signed: bool) -> Self {
        GroupCursor {
            elements: &group.elements,
            iter: SubsetIter::new(group.elements.len(), group.t),
            gray: GraySigns::new(if signed { group.t } else { 0 }),
        }
    }

    fn fill(elements: &[i32], indices: &[usize], segment: &mut [i32]) {
        for (slot, &index) in segment.iter_mut().zip(indices) {
            *slot = elements[index];
        }
    }

    /// Positions the cursor on its first combination; `false` if the
    /// group produces none.
    fn start(&mut self, segment: &mut [i32]) -> bool {
        self.iter.reset();
        self.gray.reset();
        let elements = self.elements;
        match self.iter.next_subset() {
            Some(indices) => {
                Self::fill(elements, indices, segment);
                true
            }
            None => false,
        }
    }

    /// Advances within the group; `false` once the group wrapped around.
    fn advance(&mut self, segment: &mut [i32]) -> bool {
        if let Some(bit) = self.gray.next_flip() {
            segment[bit] = -segment[bit];
            return true;
        }
        let elements = self.elements;
        if let Some(indices) = self.iter.next_subset() {
            Self::fill(elements, indices, segment);
            self.gray.reset();
            true
        } else {
            false
        }
    }
}

fn segment_offsets(groups: &[Group]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for group in groups {
        offsets.push(offset);
        offset += group.t;
    }
    offsets
}

fn walk_groups<E, F>(groups: &[Group], signed: bool, env: &mut E, consumer: &mut F)
where
    F: FnMut(&mut E, &[i32]),
{
    let width: usize = groups.iter().map(|g| g.t).sum();
    let offsets = segment_offsets(groups);
    let mut buffer = vec![0i32; width];
    let mut cursors: Vec<GroupCursor> = groups.iter().map(|g| GroupCursor::new(g, signed)).collect();

    for (index, cursor) in cursors.iter_mut().enumerate() {
        let segment = &mut buffer[offsets[index]..offsets[index] + groups[index].t];
        if !cursor.start(segment) {
            return;
        }
    }
    consumer(env, &buffer);

    // Odometer over the groups, last group fastest.
    'outer: loop {
        let mut index = groups.len();
        loop {
            if index == 0 {
                break 'outer;
            }
            index -= 1;
            let segment = &mut buffer[offsets[index]..offsets[index] + groups[index].t];
            if cursors[index].advance(segment) {
                break;
            }
            let restarted = cursors[index].start(segment);
            debug_assert!(restarted);
        }
        consumer(env, &buffer);
    }
}

fn par_walk_groups<E, G, F>(groups: &[Group], signed: bool, env_factory: &G, consumer: &F)
where
    E: Send,
    G: Fn() -> E + Sync + Send,
    F: Fn(&mut E, &[i32]) + Sync + Send,
{
    let width: usize = groups.iter().map(|g| g.t).sum();

    // Workers are handed subset ranks; the sign dimension is expanded
    // inside each task. Fall back to a sequential walk when the subset
    // space cannot be ranked in 64 bits.
    let mut counts = Vec::with_capacity(groups.len());
    let mut total: Option<u64> = Some(1);
    for group in groups {
        let count = crate::utils::checked_binomial(group.elements.len() as u64, group.t as u64);
        counts.push(count.unwrap_or(0));
        total = match (total, count) {
            (Some(acc), Some(c)) => acc.checked_mul(c),
            _ => None,
        };
    }
    let Some(total) = total else {
        log::warn!("combination space too large to rank; enumerating sequentially");
        let mut env = env_factory();
        walk_groups(groups, signed, &mut env, &mut |env, c| consumer(env, c));
        return;
    };
    if signed && width >= 64 {
        log::warn!("sign dimension too large to rank; enumerating sequentially");
        let mut env = env_factory();
        walk_groups(groups, signed, &mut env, &mut |env, c| consumer(env, c));
        return;
    }

    let offsets = segment_offsets(groups);
    let max_t = groups.iter().map(|g| g.t).max().unwrap_or(0);
    (0..total).into_par_iter().for_each_init(
        || (env_factory(), vec![0i32; width], vec![0usize; max_t]),
        |state, rank| {
            let (env, buffer, indices) = state;
            emit_ranked(groups, signed, &counts, &offsets, rank, buffer, indices, env, consumer);
        },
    );
}

#[allow(clippy::too_many_arguments)]
fn emit_ranked<E, F>(
    groups: &[Group],
    signed: bool,
    counts: &[u64],
    offsets: &[usize],
    mut rank: u64,
    buffer: &mut [i32],
    indices: &mut [usize],
    env: &mut E,
    consumer: &F,
) where
    F: Fn(&mut E, &[i32]),
{
    // Decompose the rank into per-group subset ranks, last group fastest.
    for index in (0..groups.len()).rev() {
        let digit = rank % counts[index];
        rank /= counts[index];
        let group = &groups[index];
        let subset = &mut indices[..group.t];
        unrank_subset(digit, group.elements.len(), group.t, subset);
        let segment = &mut buffer[offsets[index]..offsets[index] + group.t];
        for (slot, &i) in segment.iter_mut().zip(subset.iter()) {
            *slot = group.elements[i];
        }
    }
    consumer(env, buffer);
    if signed {
        let mut gray = GraySigns::new(buffer.len());
        while let Some(bit) = gray.next_flip() {
            buffer[bit] = -buffer[bit];
            consumer(env, buffer);
        }
    }
}
