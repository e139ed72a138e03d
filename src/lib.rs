//! # cit-rs: Combinatorial Interaction Testing primitives in Rust
//!
//! **`cit-rs`** provides the two cooperating subsystems at the heart of
//! combinatorial interaction testing (CIT) of configurable software:
//!
//! - **Combination specifications** describe a combinatorial universe
//!   (one or more groups of elements with a strength `t` per group) and
//!   enumerate every t-wise combination, sequentially or in parallel,
//!   with an optional Gray-code sign dimension for signed literals.
//! - **Interaction finders** localize a minimal faulty interaction from
//!   a labeled sample of configurations, narrowing a candidate set with
//!   as few calls to the external completion oracle and verifier as
//!   possible.
//!
//! ## Basic Usage
//!
//! ```rust
//! use cit_rs::combinations::CombinationSpec;
//! use cit_rs::variable_map::VariableMap;
//!
//! // Every pair out of three literals:
//! let spec = CombinationSpec::literals(vec![1, 2, 3], 2, VariableMap::anonymous(3));
//! assert_eq!(spec.loop_count(), 3);
//!
//! let mut seen = Vec::new();
//! spec.for_each(|combination| seen.push(combination.to_vec()));
//! assert_eq!(seen, vec![vec![1, 2], vec![1, 3], vec![2, 3]]);
//! ```
//!
//! Localizing a faulty pair with an in-process verifier:
//!
//! ```rust
//! use cit_rs::finder::{InteractionFinder, SearchStrategy};
//! use cit_rs::literal_set::LiteralSet;
//!
//! // Configurations fail exactly when variables 1 and 2 are both set.
//! let verifier = |conf: &LiteralSet| !(conf.contains_literal(1) && conf.contains_literal(2));
//! let oracle = |_: &LiteralSet| -> Option<LiteralSet> { None };
//!
//! let sample = vec![
//!     LiteralSet::from_literals([1, 2, 3, -4]),
//!     LiteralSet::from_literals([1, 2, -3, 4]),
//!     LiteralSet::from_literals([1, -2, 3, 4]),
//!     LiteralSet::from_literals([-1, 2, 3, 4]),
//! ];
//! let mut finder = InteractionFinder::new(sample, oracle, verifier);
//! let interaction = finder.find(2, SearchStrategy::Split);
//! assert_eq!(interaction, LiteralSet::from_literals([1, 2]));
//! ```
//!
//! ## Core Components
//!
//! - **[`combinations`]**: combination specifications and their
//!   sequential and parallel traversals.
//! - **[`finder`]**: interaction finders and the narrowing strategies
//!   (naive, binary splitting, strength sweep).
//! - **[`literal_set`]** / **[`variable_map`]**: the literal-set and
//!   variable-map collaborator types everything else is built on.
//! - **[`oracle`]**: the completion-oracle and verifier contracts that
//!   connect a finder to an external solver or build-and-test cycle.

pub mod combinations;
pub mod finder;
pub mod literal_set;
pub mod oracle;
mod split;
pub mod subsets;
mod sweep;
pub mod utils;
pub mod variable_map;

pub use combinations::{CombinationSpec, Group};
pub use finder::{Classified, FinderStatistics, InteractionFinder, SearchStrategy};
pub use literal_set::LiteralSet;
pub use oracle::{ConfigurationOracle, ConfigurationVerifier};
pub use variable_map::VariableMap;
