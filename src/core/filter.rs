//! Filter capability traits and the raw state snapshot.
//!
//! # Trait Hierarchy
//!
//! ```text
//! BloomFilter<V>         (&mut self mutation; every variant)
//! SharedBloomFilter<V>   (&self mutation; GlobalLock, LockFree, Sharded)
//! ```
//!
//! Rust's borrow rules already distinguish the two disciplines:
//!
//! - **Exclusive access** (`&mut T`): only the owner mutates. The exclusive filter
//!   implements [`BloomFilter`] alone, so sharing it across threads for mutation
//!   does not compile without an external lock.
//! - **Shared access** (`&T`): internal synchronization makes `Arc<F>` enough. The
//!   three synchronized variants implement both traits; through [`BloomFilter`] they
//!   simply ignore the exclusivity they are given.
//!
//! Callers that do not care about the discipline write generic code against
//! [`BloomFilter`], which makes every variant a drop-in substitute for every other.
//!
//! # Union Through Snapshots
//!
//! `union` takes a [`FilterState`], not another filter. Every variant produces one
//! with `state()`, so a filter of any variant can absorb any other without locking
//! two filters at once. The concrete types also offer `union_with(&other)` for the
//! same-type case.
//!
//! # Examples
//!
//! ```
//! use bloomsync::core::BloomFilter;
//! use bloomsync::filters::ExclusiveBloomFilter;
//! use bloomsync::sync::LockFreeBloomFilter;
//!
//! fn fill<F: BloomFilter<str>>(filter: &mut F) {
//!     filter.add("alpha");
//!     filter.add("beta");
//! }
//!
//! let mut exclusive = ExclusiveBloomFilter::new("names", 1024, 3).unwrap();
//! let mut lock_free = LockFreeBloomFilter::new("names", 1024, 3).unwrap();
//! fill(&mut exclusive);
//! fill(&mut lock_free);
//! assert_eq!(exclusive.state().words(), lock_free.state().words());
//! ```

#![allow(clippy::module_name_repetitions)]

use super::bitvec::BitField;
use super::params::{estimate_current_rate, FilterParams};
use crate::error::{BloomSyncError, Result};
use crate::hash::CanonicalBytes;

/// A consistent copy of a filter's parameters and raw words.
///
/// The word vector always has `⌈num_bits/64⌉` entries and no bits set at positions
/// `>= num_bits`; [`FilterState::new`] enforces both.
///
/// # Examples
///
/// ```
/// use bloomsync::core::{FilterParams, FilterState, Seeds};
///
/// let params = FilterParams::new("s", 100, 3, Seeds::DEFAULT).unwrap();
/// let state = FilterState::new(params.clone(), vec![0b101, 0]).unwrap();
/// assert_eq!(state.count_ones(), 2);
///
/// // Bit 100 is beyond the filter
/// assert!(FilterState::new(params, vec![0, 1 << 36]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    params: FilterParams,
    words: Vec<u64>,
}

impl FilterState {
    /// Validate and wrap raw words.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidParameters`] if `params` are invalid, and
    /// [`BloomSyncError::InvalidState`] if the words do not fit them.
    pub fn new(params: FilterParams, words: Vec<u64>) -> Result<Self> {
        params.validate()?;
        let words = BitField::from_words(words, params.num_bits())?.to_words();
        Ok(Self { params, words })
    }

    /// An all-zero state for `params`.
    #[must_use]
    pub fn empty(params: FilterParams) -> Self {
        let words = vec![0; params.num_words()];
        Self { params, words }
    }

    /// Wrap words produced internally by a filter, which already satisfy the
    /// word-count and tail invariants.
    pub(crate) fn from_parts(params: FilterParams, words: Vec<u64>) -> Self {
        debug_assert_eq!(words.len(), params.num_words());
        Self { params, words }
    }

    /// The filter parameters.
    #[must_use]
    #[inline]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// The raw words.
    #[must_use]
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Split into parameters and words.
    #[must_use]
    pub fn into_parts(self) -> (FilterParams, Vec<u64>) {
        (self.params, self.words)
    }

    /// Union-compatibility of the two states' parameters.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.params.is_union_compatible(&other.params)
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Add/check/reset/union under exclusive mutation.
///
/// # Guarantees
///
/// - **No false negatives**: after `add(v)` returns, `check(v)` is `true` until the
///   next `reset`.
/// - **Reset**: after `reset()`, `check(v)` is `false` for every `v` not re-added.
/// - **Union**: `union(s)` ORs `s` into this filter when the parameters are
///   union-compatible and returns `true`; otherwise nothing changes and it returns
///   `false`.
pub trait BloomFilter<V: CanonicalBytes + ?Sized>: Send + Sync {
    /// Set the `k` bits derived from `value`.
    fn add(&mut self, value: &V);

    /// `true` if all `k` bits derived from `value` are set.
    ///
    /// `false` means `value` was definitely never added since the last reset.
    #[must_use]
    fn check(&self, value: &V) -> bool;

    /// Clear every bit.
    fn reset(&mut self);

    /// OR-merge `other` into this filter if the parameters are union-compatible.
    ///
    /// Returns whether the merge happened. A mismatch is not an error.
    fn union(&mut self, other: &FilterState) -> bool;

    /// A copy of the parameters and raw words.
    #[must_use]
    fn state(&self) -> FilterState;

    /// The filter parameters.
    #[must_use]
    fn params(&self) -> &FilterParams;

    /// Number of set bits.
    #[must_use]
    fn count_ones(&self) -> usize;

    /// Add every value.
    fn add_batch<'a, I>(&mut self, values: I)
    where
        V: 'a,
        I: IntoIterator<Item = &'a V>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// `true` if every value checks positive.
    #[must_use]
    fn check_all<'a, I>(&self, values: I) -> bool
    where
        V: 'a,
        I: IntoIterator<Item = &'a V>,
    {
        values.into_iter().all(|value| self.check(value))
    }

    /// `true` if any value checks positive.
    #[must_use]
    fn check_any<'a, I>(&self, values: I) -> bool
    where
        V: 'a,
        I: IntoIterator<Item = &'a V>,
    {
        values.into_iter().any(|value| self.check(value))
    }

    /// [`union`](Self::union) with a `Result` for `?` call sites.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::IncompatibleFilters`] naming the mismatched parameter.
    fn try_union(&mut self, other: &FilterState) -> Result<()> {
        if let Some(reason) = self.params().incompatibility(other.params()) {
            return Err(BloomSyncError::incompatible_filters(reason));
        }
        self.union(other);
        Ok(())
    }

    /// False positive estimate, inferring the number of additions from the fill.
    #[must_use]
    fn estimated_false_positive_rate(&self) -> f64 {
        let params = self.params();
        estimate_current_rate(params.num_bits(), params.num_hashes(), self.count_ones())
    }

    /// `true` if no bit is set.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.count_ones() == 0
    }
}

/// Add/check/reset/union through `&self`, for filters that synchronize internally.
///
/// Implementors can be shared as `Arc<F>` with no outer lock.
///
/// ```
/// use bloomsync::sync::ShardedBloomFilter;
/// use std::sync::Arc;
/// use std::thread;
///
/// let filter = Arc::new(ShardedBloomFilter::new("ids", 4096, 4, 16).unwrap());
///
/// let handles: Vec<_> = (0..4u64)
///     .map(|t| {
///         let f = Arc::clone(&filter);
///         thread::spawn(move || {
///             for i in 0..100u64 {
///                 f.add(&(t * 1000 + i));
///             }
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
/// assert!(filter.check(&3042u64));
/// ```
pub trait SharedBloomFilter<V: CanonicalBytes + ?Sized>: Send + Sync {
    /// Set the `k` bits derived from `value`.
    fn add(&self, value: &V);

    /// `true` if all `k` bits derived from `value` are set.
    #[must_use]
    fn check(&self, value: &V) -> bool;

    /// Clear every bit.
    fn reset(&self);

    /// OR-merge `other` into this filter if the parameters are union-compatible.
    fn union(&self, other: &FilterState) -> bool;

    /// A copy of the parameters and raw words.
    #[must_use]
    fn state(&self) -> FilterState;

    /// The filter parameters.
    #[must_use]
    fn params(&self) -> &FilterParams;

    /// Number of set bits.
    #[must_use]
    fn count_ones(&self) -> usize;

    /// Add every value.
    fn add_batch<'a, I>(&self, values: I)
    where
        V: 'a,
        I: IntoIterator<Item = &'a V>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// `true` if every value checks positive.
    #[must_use]
    fn check_all<'a, I>(&self, values: I) -> bool
    where
        V: 'a,
        I: IntoIterator<Item = &'a V>,
    {
        values.into_iter().all(|value| self.check(value))
    }

    /// `true` if any value checks positive.
    #[must_use]
    fn check_any<'a, I>(&self, values: I) -> bool
    where
        V: 'a,
        I: IntoIterator<Item = &'a V>,
    {
        values.into_iter().any(|value| self.check(value))
    }

    /// [`union`](Self::union) with a `Result` for `?` call sites.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::IncompatibleFilters`] naming the mismatched parameter.
    fn try_union(&self, other: &FilterState) -> Result<()> {
        if let Some(reason) = self.params().incompatibility(other.params()) {
            return Err(BloomSyncError::incompatible_filters(reason));
        }
        self.union(other);
        Ok(())
    }

    /// False positive estimate, inferring the number of additions from the fill.
    #[must_use]
    fn estimated_false_positive_rate(&self) -> f64 {
        let params = self.params();
        estimate_current_rate(params.num_bits(), params.num_hashes(), self.count_ones())
    }

    /// `true` if no bit is set.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.count_ones() == 0
    }

    /// Add a slice of values on the rayon thread pool.
    #[cfg(feature = "rayon")]
    fn par_add_batch<T>(&self, values: &[T])
    where
        T: std::borrow::Borrow<V> + Sync,
    {
        use rayon::prelude::*;
        values.par_iter().for_each(|value| self.add(value.borrow()));
    }

    /// Check a slice of values on the rayon thread pool, preserving order.
    #[cfg(feature = "rayon")]
    #[must_use]
    fn par_check_all<T>(&self, values: &[T]) -> Vec<bool>
    where
        T: std::borrow::Borrow<V> + Sync,
    {
        use rayon::prelude::*;
        values
            .par_iter()
            .map(|value| self.check(value.borrow()))
            .collect()
    }
}
