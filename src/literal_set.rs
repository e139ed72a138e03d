//! Ordered sets of signed literals.
//!
//! A [`LiteralSet`] is an ordered collection of distinct non-zero literals
//! with at most one polarity per variable. Literals are DIMACS-style
//! signed integers: the magnitude is a 1-based variable index, the sign
//! is the polarity. Sets are kept sorted by variable, which makes
//! containment tests and the merge-style set operations cheap.
//!
//! Configurations (complete or partial assignments) and interactions
//! (failure hypotheses) are both represented as literal sets; the two
//! differ only in how many variables they cover.

use std::cmp::Ordering;
use std::fmt;

use crate::variable_map::VariableMap;

/// An ordered set of distinct non-zero literals, at most one per variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LiteralSet {
    literals: Vec<i32>,
}

impl LiteralSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { literals: Vec::new() }
    }

    /// Builds a set from arbitrary literals.
    ///
    /// Literals are sorted by variable; a later literal over an already
    /// present variable is dropped.
    ///
    /// # Panics
    ///
    /// Panics if any literal is zero.
    pub fn from_literals(literals: impl IntoIterator<Item = i32>) -> Self {
        let mut lits: Vec<i32> = literals.into_iter().collect();
        for &lit in &lits {
            assert_ne!(lit, 0, "literal 0 does not reference a variable");
        }
        lits.sort_by_key(|lit| lit.unsigned_abs());
        lits.dedup_by_key(|lit| lit.unsigned_abs());
        Self { literals: lits }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// The literal at position `i` in variable order.
    pub fn get(&self, i: usize) -> i32 {
        self.literals[i]
    }

    pub fn literals(&self) -> &[i32] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.literals.iter().copied()
    }

    /// The literal over the given variable, if present.
    pub fn literal_of_variable(&self, var: u32) -> Option<i32> {
        self.literals
            .binary_search_by_key(&var, |lit| lit.unsigned_abs())
            .ok()
            .map(|pos| self.literals[pos])
    }

    pub fn contains_literal(&self, lit: i32) -> bool {
        self.literal_of_variable(lit.unsigned_abs()) == Some(lit)
    }

    pub fn contains_variable(&self, var: u32) -> bool {
        self.literal_of_variable(var).is_some()
    }

    /// Checks that every literal of `other` is present in `self`.
    pub fn contains_all(&self, other: &LiteralSet) -> bool {
        other.iter().all(|lit| self.contains_literal(lit))
    }

    /// Set difference: the literals of `self` not present in `other`.
    pub fn remove_all(&self, other: &LiteralSet) -> LiteralSet {
        LiteralSet {
            literals: self.iter().filter(|&lit| !other.contains_literal(lit)).collect(),
        }
    }

    /// Set intersection: the literals present in both sets.
    pub fn retain_all(&self, other: &LiteralSet) -> LiteralSet {
        LiteralSet {
            literals: self.iter().filter(|&lit| other.contains_literal(lit)).collect(),
        }
    }

    /// Set union. On a polarity conflict the receiver's literal wins.
    pub fn merge(&self, other: &LiteralSet) -> LiteralSet {
        let mut merged = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            let a = self.literals[i];
            let b = other.literals[j];
            match a.unsigned_abs().cmp(&b.unsigned_abs()) {
                Ordering::Less => {
                    merged.push(a);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(b);
                    j += 1;
                }
                Ordering::Equal => {
                    merged.push(a);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.literals[i..]);
        merged.extend_from_slice(&other.literals[j..]);
        LiteralSet { literals: merged }
    }

    /// Flips the polarity of every literal.
    pub fn negate(&self) -> LiteralSet {
        LiteralSet {
            literals: self.iter().map(|lit| -lit).collect(),
        }
    }

    /// Intersection over a family of sets. Empty input yields the empty set.
    pub fn common_literals(sets: &[LiteralSet]) -> LiteralSet {
        let Some(first) = sets.first() else {
            return LiteralSet::new();
        };
        sets[1..].iter().fold(first.clone(), |acc, set| acc.retain_all(set))
    }

    /// Renumbers the literals from `old` map indices to `new` map indices.
    pub fn adapt(&mut self, old: &VariableMap, new: &VariableMap, strict: bool) {
        old.adapt_literals(&mut self.literals, new, strict);
        self.literals.sort_by_key(|lit| lit.unsigned_abs());
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.literals
    }
}

impl fmt::Display for LiteralSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, lit) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<i32>> for LiteralSet {
    fn from(literals: Vec<i32>) -> Self {
        LiteralSet::from_literals(literals)
    }
}

impl FromIterator<i32> for LiteralSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        LiteralSet::from_literals(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(lits: impl IntoIterator<Item = i32>) -> LiteralSet {
        LiteralSet::from_literals(lits)
    }

    #[test]
    fn test_construction_sorts_and_dedups() {
        let s = set([3, -1, 2, -3]);
        assert_eq!(s.literals(), &[-1, 2, 3]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(0), -1);
    }

    #[test]
    #[should_panic(expected = "literal 0")]
    fn test_zero_literal_panics() {
        set([1, 0, 2]);
    }

    #[test]
    fn test_containment() {
        let s = set([1, -2, 3]);
        assert!(s.contains_literal(1));
        assert!(s.contains_literal(-2));
        assert!(!s.contains_literal(2));
        assert!(s.contains_variable(2));
        assert!(!s.contains_variable(4));
        assert!(s.contains_all(&set([1, 3])));
        assert!(s.contains_all(&set([])));
        assert!(!s.contains_all(&set([1, 2])));
    }

    #[test]
    fn test_remove_and_retain() {
        let s = set([1, -2, 3, 4]);
        assert_eq!(s.remove_all(&set([-2, 4])).literals(), &[1, 3]);
        // Removal matches literal values, not variables.
        assert_eq!(s.remove_all(&set([2])).literals(), &[1, -2, 3, 4]);
        assert_eq!(s.retain_all(&set([3, 4, 5])).literals(), &[3, 4]);
        assert_eq!(s.retain_all(&set([2])).literals(), &[] as &[i32]);
    }

    #[test]
    fn test_merge() {
        let a = set([1, -2]);
        let b = set([2, 3]);
        // Receiver wins the polarity conflict on variable 2.
        assert_eq!(a.merge(&b).literals(), &[1, -2, 3]);
        assert_eq!(b.merge(&a).literals(), &[1, 2, 3]);
        assert_eq!(a.merge(&LiteralSet::new()), a);
    }

    #[test]
    fn test_negate() {
        let s = set([1, -2, 3]);
        assert_eq!(s.negate().literals(), &[-1, 2, -3]);
        assert_eq!(s.negate().negate(), s);
    }

    #[test]
    fn test_common_literals() {
        let sets = vec![set([1, 2, 3, -4]), set([1, 2, -3, -4]), set([1, 2, 3, 4])];
        assert_eq!(LiteralSet::common_literals(&sets).literals(), &[1, 2]);
        assert!(LiteralSet::common_literals(&[]).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(set([1, -2]).to_string(), "[1, -2]");
        assert_eq!(LiteralSet::new().to_string(), "[]");
    }

    #[test]
    fn test_adapt_reorders() {
        let old = VariableMap::from_names(["a", "b", "c"]);
        let new = VariableMap::from_names(["c", "b", "a"]);
        let mut s = set([1, -3]);
        s.adapt(&old, &new, true);
        // "a" is now variable 3, "c" is now variable 1.
        assert_eq!(s.literals(), &[-1, 3]);
    }
}
