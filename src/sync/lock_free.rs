//! Lock-free Bloom filter.
//!
//! Bits live in an [`AtomicBitField`]. `add` sets each derived bit with a
//! compare-and-swap loop that exits as soon as the bit is seen set; `check` does one
//! `Acquire` load per derived bit. No call ever takes a lock or waits on another
//! thread: a failed CAS means some other thread's CAS on the same word succeeded.
//!
//! # Memory Ordering
//!
//! ```text
//! Thread A (add):                    Thread B (check):
//! ───────────────                    ─────────────────
//! idx = derive(v)                    idx = derive(v)
//! CAS word[idx] [AcqRel]   ───────►  load word[idx] [Acquire]
//! ```
//!
//! Once `add(v)` has returned, every bit of `v` is set and a later `check(v)` on any
//! thread observes them. A `check` racing with the `add` may see only some of the
//! bits and return `false`.
//!
//! `reset` stores zero into each word and `union` ORs each word in; both are
//! per-word atomic, so a concurrent reader sees each bit as either old or new.

use crate::core::bitvec::AtomicBitField;
use crate::core::filter::FilterState;
use crate::core::params::{FilterParams, Seeds};
use crate::error::Result;
use crate::hash::{CanonicalBytes, IndexDeriver};
use crate::persist::PersistenceCodec;
use std::fmt;

/// Bloom filter over atomic words, with no locks.
///
/// # Examples
///
/// ```
/// use bloomsync::sync::LockFreeBloomFilter;
/// use std::sync::Arc;
///
/// let filter = Arc::new(LockFreeBloomFilter::new("ips", 1 << 14, 4).unwrap());
/// let clone = Arc::clone(&filter);
/// std::thread::spawn(move || clone.add("10.0.0.1")).join().unwrap();
/// assert!(filter.check("10.0.0.1"));
/// ```
pub struct LockFreeBloomFilter {
    params: FilterParams,
    deriver: IndexDeriver,
    bits: AtomicBitField,
}

impl LockFreeBloomFilter {
    /// Create a filter with the default seeds.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidParameters`](crate::BloomSyncError::InvalidParameters)
    /// if `num_bits` or `num_hashes` is zero.
    pub fn new(id: impl Into<String>, num_bits: usize, num_hashes: usize) -> Result<Self> {
        Self::with_seeds(id, num_bits, num_hashes, Seeds::DEFAULT)
    }

    /// Create a filter with explicit seeds.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidParameters`](crate::BloomSyncError::InvalidParameters)
    /// if `num_bits` or `num_hashes` is zero.
    pub fn with_seeds(
        id: impl Into<String>,
        num_bits: usize,
        num_hashes: usize,
        seeds: Seeds,
    ) -> Result<Self> {
        let params = FilterParams::new(id, num_bits, num_hashes, seeds)?;
        Ok(Self::from_params(params))
    }

    /// Create an empty filter from validated parameters.
    #[must_use]
    pub fn from_params(params: FilterParams) -> Self {
        tracing::debug!(
            variant = "lock_free",
            id = params.id(),
            num_bits = params.num_bits(),
            num_hashes = params.num_hashes(),
            "bloom filter created"
        );
        Self {
            bits: AtomicBitField::new(params.num_bits()),
            deriver: IndexDeriver::new(&params),
            params,
        }
    }

    /// Create a filter with `state`'s parameters and bits.
    #[must_use]
    pub fn from_state(state: &FilterState) -> Self {
        let filter = Self::from_params(state.params().clone());
        filter.union(state);
        filter
    }

    /// Restore a filter persisted under `id`.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::ArtifactNotFound`](crate::BloomSyncError::ArtifactNotFound)
    /// if nothing is stored under `id`, or whatever else the store reports.
    pub fn load<S: PersistenceCodec + ?Sized>(id: &str, store: &S) -> Result<Self> {
        Ok(Self::from_state(&store.load(id)?))
    }

    /// Set the bits derived from `value`.
    #[inline]
    pub fn add<V: CanonicalBytes + ?Sized>(&self, value: &V) {
        for idx in self.deriver.derive_value(value) {
            self.bits.set_bit(idx);
        }
    }

    /// `true` if every bit derived from `value` is set.
    #[must_use]
    #[inline]
    pub fn check<V: CanonicalBytes + ?Sized>(&self, value: &V) -> bool {
        self.deriver
            .derive_value(value)
            .into_iter()
            .all(|idx| self.bits.test_bit(idx))
    }

    /// Clear every bit.
    pub fn reset(&self) {
        self.bits.clear_all();
    }

    /// OR-merge `other` if union-compatible; returns whether it merged.
    pub fn union(&self, other: &FilterState) -> bool {
        if let Some(reason) = self.params.incompatibility(other.params()) {
            tracing::debug!(id = self.params.id(), other = other.params().id(), %reason, "union rejected");
            return false;
        }
        self.bits.merge_words(other.words());
        true
    }

    /// Parameters and a per-word atomic copy of the raw words.
    #[must_use]
    pub fn state(&self) -> FilterState {
        FilterState::from_parts(self.params.clone(), self.bits.to_words())
    }

    /// The filter parameters.
    #[must_use]
    #[inline]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Approximate bytes used by the bit storage and the filter itself.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.bits.memory_usage() + self.params.id().len() + std::mem::size_of::<Self>()
    }
}

impl_synchronized_filter!(LockFreeBloomFilter);

impl fmt::Debug for LockFreeBloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeBloomFilter")
            .field("id", &self.params.id())
            .field("num_bits", &self.params.num_bits())
            .field("num_hashes", &self.params.num_hashes())
            .finish()
    }
}
