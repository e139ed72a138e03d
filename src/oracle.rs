//! External collaborator contracts: configuration completion and
//! verification.
//!
//! Both oracles typically wrap an expensive external process (a SAT call,
//! a build-and-test cycle) and are invoked synchronously; callers that
//! need bounded latency must wrap them themselves.

use crate::literal_set::LiteralSet;

/// Extends a partial assignment into a full configuration.
pub trait ConfigurationOracle {
    /// Returns a complete configuration consistent with `partial`, or
    /// `None` if none exists or none was found.
    fn complete(&mut self, partial: &LiteralSet) -> Option<LiteralSet>;
}

impl<F> ConfigurationOracle for F
where
    F: FnMut(&LiteralSet) -> Option<LiteralSet>,
{
    fn complete(&mut self, partial: &LiteralSet) -> Option<LiteralSet> {
        self(partial)
    }
}

/// Pass/fail oracle over complete configurations.
pub trait ConfigurationVerifier {
    /// `true` if the configuration passes, `false` if it fails.
    fn test(&mut self, configuration: &LiteralSet) -> bool;
}

impl<F> ConfigurationVerifier for F
where
    F: FnMut(&LiteralSet) -> bool,
{
    fn test(&mut self, configuration: &LiteralSet) -> bool {
        self(configuration)
    }
}
