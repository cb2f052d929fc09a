//! Bloom filter behind a single reader-writer lock.
//!
//! Every operation holds the lock for its whole duration, including index
//! derivation: `add`, `reset` and `union` take it exclusively, `check`, `state` and
//! `count_ones` take it shared. Each call therefore sees and leaves a consistent
//! field, at the cost of serializing all writers.
//!
//! The lock is `parking_lot::RwLock`, which is writer-fair and does not poison.

use crate::core::bitvec::BitField;
use crate::core::filter::FilterState;
use crate::core::params::{FilterParams, Seeds};
use crate::error::Result;
use crate::hash::{CanonicalBytes, IndexDeriver};
use crate::persist::PersistenceCodec;
use parking_lot::RwLock;
use std::fmt;

/// Bloom filter whose bit field is guarded by one `RwLock`.
///
/// # Examples
///
/// ```
/// use bloomsync::sync::GlobalLockBloomFilter;
///
/// let filter = GlobalLockBloomFilter::new("orders", 8192, 4).unwrap();
/// filter.add(&1001u64);
/// assert!(filter.check(&1001u64));
/// assert!(!filter.check(&1002u64));
/// ```
pub struct GlobalLockBloomFilter {
    params: FilterParams,
    deriver: IndexDeriver,
    bits: RwLock<BitField>,
}

impl GlobalLockBloomFilter {
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
            variant = "global_lock",
            id = params.id(),
            num_bits = params.num_bits(),
            num_hashes = params.num_hashes(),
            "bloom filter created"
        );
        Self {
            bits: RwLock::new(BitField::new(params.num_bits())),
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

    /// Set the bits derived from `value` under the exclusive lock.
    pub fn add<V: CanonicalBytes + ?Sized>(&self, value: &V) {
        let mut bits = self.bits.write();
        for idx in self.deriver.derive_value(value) {
            bits.set_bit(idx);
        }
    }

    /// `true` if every bit derived from `value` is set, read under the shared lock.
    #[must_use]
    pub fn check<V: CanonicalBytes + ?Sized>(&self, value: &V) -> bool {
        let bits = self.bits.read();
        self.deriver
            .derive_value(value)
            .into_iter()
            .all(|idx| bits.test_bit(idx))
    }

    /// Clear every bit.
    pub fn reset(&self) {
        self.bits.write().clear_all();
    }

    /// OR-merge `other` if union-compatible; returns whether it merged.
    pub fn union(&self, other: &FilterState) -> bool {
        if let Some(reason) = self.params.incompatibility(other.params()) {
            tracing::debug!(id = self.params.id(), other = other.params().id(), %reason, "union rejected");
            return false;
        }
        self.bits.write().merge_words(other.words());
        true
    }

    /// Parameters and a copy of the raw words, taken under the shared lock.
    #[must_use]
    pub fn state(&self) -> FilterState {
        let words = self.bits.read().to_words();
        FilterState::from_parts(self.params.clone(), words)
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
        self.bits.read().count_ones()
    }

    /// Approximate bytes used by the bit storage and the filter itself.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.bits.read().memory_usage() + self.params.id().len() + std::mem::size_of::<Self>()
    }
}

impl_synchronized_filter!(GlobalLockBloomFilter);

impl fmt::Debug for GlobalLockBloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalLockBloomFilter")
            .field("id", &self.params.id())
            .field("num_bits", &self.params.num_bits())
            .field("num_hashes", &self.params.num_hashes())
            .finish()
    }
}
