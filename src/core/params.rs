//! Filter parameters and parameter optimization.
//!
//! [`FilterParams`] is the immutable identity of a filter: its persistence key, the
//! number of addressable bits `m`, the number of probed positions `k`, and the pair
//! of hash [`Seeds`]. Two filters can be merged exactly when their `m`, `k` and seeds
//! agree; the id is deliberately excluded from that check.
//!
//! The free functions implement the classic sizing formulas:
//!
//! - False positive estimate: `p = (1 - (1 - k/m)^n)^k`
//! - Optimal bits: `m = ⌈-n × ln(ε) × log₂(e)²⌉`
//! - Optimal hashes: `k = ⌈(m/n) × ln 2⌉`
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/Time Trade-offs in Hash Coding with Allowable Errors"
//! - Kirsch & Mitzenmacher (2006). "Less Hashing, Same Performance: Building a Better Bloom Filter"

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use crate::error::{BloomSyncError, Result};
use std::f64::consts::{LN_2, LOG2_E};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// log₂(e)² ≈ 2.0813689810056077, equal to 1 / (ln 2)².
const LOG2_E_SQUARED: f64 = LOG2_E * LOG2_E;

/// Target false positive rate substituted when a caller passes one outside `(0, 1]`.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Width of one storage word in bits.
pub const WORD_BITS: usize = 64;

/// The pair of independent seeds feeding double hashing.
///
/// `primary` seeds `h1`, `secondary` seeds `h2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Seeds {
    /// Seed for the first base hash.
    pub primary: u64,
    /// Seed for the second base hash.
    pub secondary: u64,
}

impl Seeds {
    /// Seeds used by every `new` constructor.
    pub const DEFAULT: Seeds = Seeds {
        primary: 6269,
        secondary: 4241,
    };

    /// Create an explicit seed pair.
    #[must_use]
    pub const fn new(primary: u64, secondary: u64) -> Self {
        Self { primary, secondary }
    }
}

impl Default for Seeds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<(u64, u64)> for Seeds {
    fn from((primary, secondary): (u64, u64)) -> Self {
        Self::new(primary, secondary)
    }
}

/// Immutable parameters of a filter.
///
/// Constructed through [`FilterParams::new`], which rejects zero-sized filters and
/// zero hash counts. Once a filter is built its parameters never change.
///
/// # Examples
///
/// ```
/// use bloomsync::core::{FilterParams, Seeds};
///
/// let a = FilterParams::new("a", 1024, 3, Seeds::DEFAULT).unwrap();
/// let b = FilterParams::new("b", 1024, 3, Seeds::DEFAULT).unwrap();
/// let c = FilterParams::new("c", 1024, 3, Seeds::new(1, 2)).unwrap();
///
/// assert!(a.is_union_compatible(&b)); // ids may differ
/// assert!(!a.is_union_compatible(&c));
/// assert_eq!(a.num_words(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterParams {
    id: String,
    num_bits: usize,
    num_hashes: usize,
    seeds: Seeds,
}

impl FilterParams {
    /// Validate and build a parameter set.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidParameters`] if `num_bits == 0` or `num_hashes == 0`.
    pub fn new(
        id: impl Into<String>,
        num_bits: usize,
        num_hashes: usize,
        seeds: Seeds,
    ) -> Result<Self> {
        let params = Self {
            id: id.into(),
            num_bits,
            num_hashes,
            seeds,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-check the invariants, used after deserialization.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_bits == 0 {
            return Err(BloomSyncError::invalid_parameters(format!(
                "filter '{}' must have at least one bit",
                self.id
            )));
        }
        if self.num_hashes == 0 {
            return Err(BloomSyncError::invalid_parameters(format!(
                "filter '{}' must use at least one hash position",
                self.id
            )));
        }
        Ok(())
    }

    /// Persistence key of the filter.
    #[must_use]
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Total addressable bit positions (`m`).
    #[must_use]
    #[inline]
    pub const fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Bit positions touched per operation (`k`).
    #[must_use]
    #[inline]
    pub const fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// The seed pair.
    #[must_use]
    #[inline]
    pub const fn seeds(&self) -> Seeds {
        self.seeds
    }

    /// Number of 64-bit words backing `num_bits` bits.
    #[must_use]
    #[inline]
    pub const fn num_words(&self) -> usize {
        words_for_bits(self.num_bits)
    }

    /// Two filters are union-compatible iff `num_bits`, `num_hashes` and seeds match.
    #[must_use]
    pub fn is_union_compatible(&self, other: &Self) -> bool {
        self.num_bits == other.num_bits
            && self.num_hashes == other.num_hashes
            && self.seeds == other.seeds
    }

    /// Explain why two parameter sets are not union-compatible, if they aren't.
    #[must_use]
    pub fn incompatibility(&self, other: &Self) -> Option<String> {
        if self.num_bits != other.num_bits {
            Some(format!(
                "num_bits differ ({} vs {})",
                self.num_bits, other.num_bits
            ))
        } else if self.num_hashes != other.num_hashes {
            Some(format!(
                "num_hashes differ ({} vs {})",
                self.num_hashes, other.num_hashes
            ))
        } else if self.seeds != other.seeds {
            Some(format!("seeds differ ({:?} vs {:?})", self.seeds, other.seeds))
        } else {
            None
        }
    }
}

/// Number of 64-bit words needed to hold `num_bits` bits.
#[must_use]
#[inline]
pub const fn words_for_bits(num_bits: usize) -> usize {
    num_bits / WORD_BITS + (num_bits % WORD_BITS != 0) as usize
}

/// Estimate the probability that `check` returns `true` for a value never added.
///
/// Implements `p = (1 - (1 - k/m)^n)^k` for a filter of `num_bits` bits probed at
/// `num_hashes` positions after `num_additions` additions. The result is clamped to
/// `[0, 1]` and is non-decreasing in `num_additions`.
///
/// # Examples
///
/// ```
/// use bloomsync::core::params::estimate_false_positive_probability;
///
/// let few = estimate_false_positive_probability(1024, 3, 10);
/// let many = estimate_false_positive_probability(1024, 3, 100);
/// assert!(many > few);
/// assert_eq!(estimate_false_positive_probability(1024, 3, 0), 0.0);
/// ```
#[must_use]
pub fn estimate_false_positive_probability(
    num_bits: usize,
    num_hashes: usize,
    num_additions: usize,
) -> f64 {
    if num_bits == 0 {
        return 1.0;
    }

    let m = num_bits as f64;
    let k = num_hashes as f64;
    let n = num_additions as f64;

    // k > m would make the base negative; such a filter saturates immediately
    let prob_bit_untouched = (1.0 - k / m).max(0.0);
    let prob_bit_set = 1.0 - prob_bit_untouched.powf(n);

    prob_bit_set.powf(k).clamp(0.0, 1.0)
}

/// Compute `(num_bits, num_hashes)` for `num_additions` values at a target rate.
///
/// A `target_false_positive_rate` outside `(0, 1]` (including NaN) is replaced by
/// [`DEFAULT_FALSE_POSITIVE_RATE`] and a warning is logged; tuning input is never a
/// hard failure. `num_additions == 0` is treated as one addition. Both results are
/// always at least 1.
///
/// # Examples
///
/// ```
/// use bloomsync::core::params::compute_optimal_parameters;
///
/// let (bits, hashes) = compute_optimal_parameters(1000, 0.01);
/// assert_eq!(bits, 9586);
/// assert_eq!(hashes, 7);
///
/// // Out-of-range targets fall back to 1%
/// assert_eq!(compute_optimal_parameters(1000, 1.5), (bits, hashes));
/// ```
#[must_use]
pub fn compute_optimal_parameters(
    num_additions: usize,
    target_false_positive_rate: f64,
) -> (usize, usize) {
    let rate = if target_false_positive_rate > 0.0 && target_false_positive_rate <= 1.0 {
        target_false_positive_rate
    } else {
        tracing::warn!(
            requested = target_false_positive_rate,
            substituted = DEFAULT_FALSE_POSITIVE_RATE,
            "target false positive rate outside (0, 1], using default"
        );
        DEFAULT_FALSE_POSITIVE_RATE
    };

    let n = num_additions.max(1) as f64;

    let bits = (-n * rate.ln() * LOG2_E_SQUARED).ceil();
    let num_bits = if bits >= usize::MAX as f64 {
        usize::MAX
    } else {
        (bits as usize).max(1)
    };

    (num_bits, optimal_num_hashes(num_bits, num_additions))
}

/// Hash count minimising the false positive rate for `num_bits` bits and
/// `num_additions` items: `k = ⌈(m/n) × ln 2⌉`, at least 1. Zero additions count as one.
///
/// # Examples
///
/// ```
/// use bloomsync::core::params::optimal_num_hashes;
///
/// assert_eq!(optimal_num_hashes(9586, 1000), 7);
/// assert_eq!(optimal_num_hashes(10, 1000), 1);
/// ```
#[must_use]
pub fn optimal_num_hashes(num_bits: usize, num_additions: usize) -> usize {
    let hashes = (num_bits as f64 / num_additions.max(1) as f64 * LN_2).ceil();
    (hashes as usize).max(1)
}

/// Infer how many additions produced `ones` set bits.
///
/// Inverse of the expected fill ratio: `n ≈ -(m/k) × ln(1 - ones/m)`. A saturated
/// field reports `num_bits`.
#[must_use]
pub fn estimate_additions(num_bits: usize, num_hashes: usize, ones: usize) -> usize {
    if ones == 0 || num_bits == 0 || num_hashes == 0 {
        return 0;
    }

    let m = num_bits as f64;
    let k = num_hashes as f64;
    let fill = ones as f64 / m;
    if fill >= 1.0 {
        return num_bits;
    }

    ((-m / k) * (1.0 - fill).ln()).round() as usize
}

/// Estimated false positive rate of a filter whose field has `ones` set bits.
#[must_use]
pub fn estimate_current_rate(num_bits: usize, num_hashes: usize, ones: usize) -> f64 {
    let additions = estimate_additions(num_bits, num_hashes, ones);
    estimate_false_positive_probability(num_bits, num_hashes, additions)
}
