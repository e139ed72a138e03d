//! Counting helpers for combination enumeration.
//!
//! Combination counts are reported as *saturating* 64-bit values: callers
//! use them for scheduling decisions, so a count beyond `u64::MAX` is
//! substituted by `u64::MAX` (with a warning) instead of failing. Exact
//! [`BigUint`] variants exist for the rare caller that needs precision.

use log::warn;
use num_bigint::BigUint;

/// Binomial coefficient `C(n, t)` as a checked 64-bit value.
///
/// Returns `None` if the result does not fit into a `u64`.
pub fn checked_binomial(n: u64, t: u64) -> Option<u64> {
    if t > n {
        return Some(0);
    }
    let t = t.min(n - t);
    let mut acc: u128 = 1;
    for i in 1..=t {
        // Exact at every step: acc * (n - t + i) is divisible by i.
        acc = acc * (n - t + i) as u128 / i as u128;
        if acc > u64::MAX as u128 {
            return None;
        }
    }
    Some(acc as u64)
}

/// Binomial coefficient `C(n, t)`, saturating to `u64::MAX` on overflow.
pub fn binomial(n: u64, t: u64) -> u64 {
    checked_binomial(n, t).unwrap_or_else(|| {
        warn!("C({}, {}) does not fit into u64, saturating", n, t);
        u64::MAX
    })
}

/// Exact binomial coefficient `C(n, t)`.
pub fn binomial_exact(n: u64, t: u64) -> BigUint {
    if t > n {
        return BigUint::ZERO;
    }
    let t = t.min(n - t);
    let mut acc = BigUint::from(1u32);
    for i in 1..=t {
        acc = acc * (n - t + i) / i;
    }
    acc
}

/// `2^t` as a checked 64-bit value.
pub fn checked_pow2(t: usize) -> Option<u64> {
    if t >= 64 {
        None
    } else {
        Some(1u64 << t)
    }
}

/// Exact `2^t`.
pub fn pow2_exact(t: usize) -> BigUint {
    BigUint::from(1u32) << t
}

/// Product of two counts, saturating to `u64::MAX` on overflow.
pub fn saturating_count_mul(a: u64, b: u64) -> u64 {
    a.checked_mul(b).unwrap_or_else(|| {
        warn!("combination count {} * {} does not fit into u64, saturating", a, b);
        u64::MAX
    })
}

/// Sum of two counts, saturating to `u64::MAX` on overflow.
pub fn saturating_count_add(a: u64, b: u64) -> u64 {
    a.checked_add(b).unwrap_or_else(|| {
        warn!("combination count {} + {} does not fit into u64, saturating", a, b);
        u64::MAX
    })
}
