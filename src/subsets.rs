//! Enumeration kernels: lexicographic t-subsets, combinadic unranking,
//! and Gray-code sign sequences.
//!
//! These are the low-level building blocks behind combination
//! specifications. [`SubsetIter`] walks all `t`-subsets of `0..n` in
//! lexicographic order while lending its internal index buffer, so a
//! full traversal performs no per-subset allocation. [`unrank_subset`]
//! jumps to the subset with a given rank, which is what lets the
//! parallel traversal hand out disjoint rank ranges to workers.
//!
//! [`GraySigns`] produces the sign dimension: starting from the
//! all-positive assignment, every following assignment is reached by
//! flipping exactly one sign. Callers that re-evaluate combinations
//! incrementally only need to look at the single changed literal.

use crate::utils::checked_binomial;

/// Lexicographic enumeration of all `t`-subsets of `0..n`.
///
/// The iterator lends its internal index buffer; callers must copy the
/// slice if they need to keep it beyond the next call.
#[derive(Debug, Clone)]
pub struct SubsetIter {
    n: usize,
    t: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl SubsetIter {
    pub fn new(n: usize, t: usize) -> Self {
        Self {
            n,
            t,
            indices: (0..t).collect(),
            started: false,
            done: t > n,
        }
    }

    /// Rewinds to the first subset.
    pub fn reset(&mut self) {
        for (i, slot) in self.indices.iter_mut().enumerate() {
            *slot = i;
        }
        self.started = false;
        self.done = self.t > self.n;
    }

    /// Advances to the next subset and returns its index positions,
    /// or `None` once all subsets were produced.
    pub fn next_subset(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }
        // Find the rightmost index with room to advance.
        let mut i = self.t;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] < self.n - self.t + i {
                break;
            }
        }
        self.indices[i] += 1;
        for j in i + 1..self.t {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(&self.indices)
    }
}

/// Writes the `t`-subset of `0..n` with the given lexicographic rank
/// into `out`.
///
/// Combinadic decomposition; `rank` must be below `C(n, t)` and
/// `out.len()` must equal `t`.
pub fn unrank_subset(mut rank: u64, n: usize, t: usize, out: &mut [usize]) {
    debug_assert_eq!(out.len(), t);
    let mut next = 0;
    for slot in 0..t {
        loop {
            let remaining = checked_binomial((n - next - 1) as u64, (t - slot - 1) as u64)
                .expect("subset count fits u64 for any rankable universe");
            if rank < remaining {
                out[slot] = next;
                next += 1;
                break;
            }
            rank -= remaining;
            next += 1;
        }
    }
}

/// Reflected Gray-code sequence of sign flips over `t` sign slots.
///
/// The implied starting assignment is all-positive; each call to
/// [`next_flip`](GraySigns::next_flip) names the single slot whose sign
/// changes next. After `2^t - 1` flips every assignment has been
/// visited exactly once.
#[derive(Debug, Clone)]
pub struct GraySigns {
    counter: u64,
    total: u64,
}

impl GraySigns {
    /// # Panics
    ///
    /// Panics if `t >= 64`.
    pub fn new(t: usize) -> Self {
        assert!(t < 64, "sign dimension too large: {}", t);
        Self {
            counter: 1,
            total: 1u64 << t,
        }
    }

    /// Rewinds to the all-positive assignment.
    pub fn reset(&mut self) {
        self.counter = 1;
    }

    /// The slot to flip next, or `None` once all assignments were visited.
    pub fn next_flip(&mut self) -> Option<usize> {
        if self.counter >= self.total {
            return None;
        }
        let bit = self.counter.trailing_zeros() as usize;
        self.counter += 1;
        Some(bit)
    }
}
