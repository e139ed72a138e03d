//! Variable maps: named variables with stable 1-based indices.
//!
//! A [`VariableMap`] assigns a contiguous 1-based index range to a list of
//! variable names. Element arrays and literal sets reference variables by
//! index only; when two collaborating components use differently numbered
//! maps, [`VariableMap::adapt_literals`] translates between them by name
//! identity.

use std::collections::HashSet;

use log::warn;

/// Maps variable names to 1-based indices (index 0 is reserved).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableMap {
    names: Vec<String>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Builds a map from variable names.
    ///
    /// # Panics
    ///
    /// Panics if a name occurs twice.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &names {
            assert!(seen.insert(name.as_str()), "duplicate variable name: {}", name);
        }
        Self { names }
    }

    /// A map of `size` generated variable names `x1..=x{size}`.
    pub fn anonymous(size: usize) -> Self {
        Self {
            names: (1..=size).map(|i| format!("x{}", i)).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// All variable indices in order.
    pub fn variables(&self) -> Vec<i32> {
        (1..=self.names.len() as i32).collect()
    }

    /// The name of the given variable, if it exists.
    pub fn name(&self, var: u32) -> Option<&str> {
        if var == 0 {
            return None;
        }
        self.names.get(var as usize - 1).map(String::as_str)
    }

    /// The index of the given name, if it exists.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.names.iter().position(|n| n == name).map(|pos| (pos + 1) as u32)
    }

    /// Union of several maps, preserving first-seen name order.
    pub fn merge(maps: &[VariableMap]) -> VariableMap {
        let mut merged = VariableMap::new();
        let mut seen = HashSet::new();
        for map in maps {
            for name in &map.names {
                if seen.insert(name.clone()) {
                    merged.names.push(name.clone());
                }
            }
        }
        merged
    }

    /// Renumbers signed elements in place from this map's numbering to `new`.
    ///
    /// Each element's variable is looked up by name in `new`; the sign is
    /// preserved. An element whose variable has no counterpart in `new`
    /// panics under `strict`, otherwise it is left unchanged with a
    /// warning.
    pub fn adapt_literals(&self, elements: &mut [i32], new: &VariableMap, strict: bool) {
        for element in elements.iter_mut() {
            let var = element.unsigned_abs();
            match self.name(var).and_then(|name| new.index_of(name)) {
                Some(index) => {
                    *element = if *element < 0 { -(index as i32) } else { index as i32 };
                }
                None => {
                    if strict {
                        panic!("variable {} has no counterpart in the new map", var);
                    }
                    warn!("variable {} has no counterpart in the new map, keeping its old index", var);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_lookup() {
        let map = VariableMap::from_names(["a", "b", "c"]);
        assert_eq!(map.size(), 3);
        assert_eq!(map.variables(), vec![1, 2, 3]);
        assert_eq!(map.name(1), Some("a"));
        assert_eq!(map.name(0), None);
        assert_eq!(map.name(4), None);
        assert_eq!(map.index_of("c"), Some(3));
        assert_eq!(map.index_of("d"), None);
    }

    #[test]
    #[should_panic(expected = "duplicate variable name")]
    fn test_duplicate_name_panics() {
        VariableMap::from_names(["a", "a"]);
    }

    #[test]
    fn test_anonymous() {
        let map = VariableMap::anonymous(3);
        assert_eq!(map.name(1), Some("x1"));
        assert_eq!(map.index_of("x3"), Some(3));
    }

    #[test]
    fn test_merge() {
        let a = VariableMap::from_names(["a", "b"]);
        let b = VariableMap::from_names(["b", "c"]);
        let merged = VariableMap::merge(&[a, b]);
        assert_eq!(merged.variables(), vec![1, 2, 3]);
        assert_eq!(merged.name(3), Some("c"));
    }

    #[test]
    fn test_adapt_roundtrip() {
        let old = VariableMap::from_names(["a", "b", "c", "d"]);
        let new = VariableMap::from_names(["d", "c", "b", "a"]);
        let mut elements = vec![1, -2, 4];
        old.adapt_literals(&mut elements, &new, true);
        assert_eq!(elements, vec![4, -3, 1]);
        new.adapt_literals(&mut elements, &old, true);
        assert_eq!(elements, vec![1, -2, 4]);
    }

    #[test]
    #[should_panic(expected = "no counterpart")]
    fn test_adapt_strict_panics() {
        let old = VariableMap::from_names(["a", "b"]);
        let new = VariableMap::from_names(["a"]);
        let mut elements = vec![2];
        old.adapt_literals(&mut elements, &new, true);
    }

    #[test]
    fn test_adapt_lenient_keeps_unmapped() {
        let old = VariableMap::from_names(["a", "b"]);
        let new = VariableMap::from_names(["b"]);
        let mut elements = vec![-1, 2];
        old.adapt_literals(&mut elements, &new, false);
        assert_eq!(elements, vec![-1, 1]);
    }
}
