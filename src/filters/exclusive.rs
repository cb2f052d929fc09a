//! Unsynchronized Bloom filter.
//!
//! [`ExclusiveBloomFilter`] owns a plain [`BitField`] and mutates it through
//! `&mut self`. It performs no locking and no atomic operations, which makes it the
//! fastest variant for single-owner use and the reference the synchronized variants
//! are tested against.
//!
//! The type is `Send + Sync`, but mutation requires `&mut`: to share it between
//! writers, wrap it in a lock or pick one of the [`sync`](crate::sync) variants.
//!
//! # Examples
//!
//! ```
//! use bloomsync::filters::ExclusiveBloomFilter;
//!
//! let mut filter = ExclusiveBloomFilter::new("visited", 10_000, 5).unwrap();
//! filter.add("https://example.com");
//! assert!(filter.check("https://example.com"));
//!
//! filter.reset();
//! assert!(!filter.check("https://example.com"));
//! ```

use crate::core::bitvec::BitField;
use crate::core::filter::{BloomFilter, FilterState};
use crate::core::params::{estimate_current_rate, FilterParams, Seeds};
use crate::error::Result;
use crate::hash::{CanonicalBytes, IndexDeriver};
use crate::persist::{ArtifactHandle, PersistenceCodec};

/// Bloom filter without internal synchronization.
#[derive(Debug, Clone)]
pub struct ExclusiveBloomFilter {
    params: FilterParams,
    bits: BitField,
    deriver: IndexDeriver,
}

impl ExclusiveBloomFilter {
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
            variant = "exclusive",
            id = params.id(),
            num_bits = params.num_bits(),
            num_hashes = params.num_hashes(),
            "bloom filter created"
        );
        Self {
            bits: BitField::new(params.num_bits()),
            deriver: IndexDeriver::new(&params),
            params,
        }
    }

    /// Create a filter with `state`'s parameters and bits.
    #[must_use]
    pub fn from_state(state: &FilterState) -> Self {
        let mut filter = Self::from_params(state.params().clone());
        filter.union(state);
        filter
    }

    /// Set the bits derived from `value`.
    #[inline]
    pub fn add<V: CanonicalBytes + ?Sized>(&mut self, value: &V) {
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
    pub fn reset(&mut self) {
        self.bits.clear_all();
    }

    /// OR-merge `other` if union-compatible; returns whether it merged.
    pub fn union(&mut self, other: &FilterState) -> bool {
        if let Some(reason) = self.params.incompatibility(other.params()) {
            tracing::debug!(id = self.params.id(), other = other.params().id(), %reason, "union rejected");
            return false;
        }
        self.bits.merge_words(other.words());
        true
    }

    /// OR-merge another exclusive filter.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if !self.params.is_union_compatible(&other.params) {
            return self.union(&other.state());
        }
        self.bits.merge_or(&other.bits);
        true
    }

    /// Parameters and a copy of the raw words.
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

    /// Persistence key.
    #[must_use]
    pub fn id(&self) -> &str {
        self.params.id()
    }

    /// Addressable bits.
    #[must_use]
    pub fn num_bits(&self) -> usize {
        self.params.num_bits()
    }

    /// Bits touched per value.
    #[must_use]
    pub fn num_hashes(&self) -> usize {
        self.params.num_hashes()
    }

    /// The seed pair.
    #[must_use]
    pub fn seeds(&self) -> Seeds {
        self.params.seeds()
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// False positive estimate from the current fill.
    #[must_use]
    pub fn estimated_false_positive_rate(&self) -> f64 {
        estimate_current_rate(self.num_bits(), self.num_hashes(), self.count_ones())
    }

    /// `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count_ones() == 0
    }

    /// Approximate bytes used by the bit storage and the filter itself.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.bits.memory_usage() + self.params.id().len() + std::mem::size_of::<Self>()
    }

    /// Persist the current state.
    ///
    /// # Errors
    ///
    /// Whatever the store reports.
    pub fn save<S: PersistenceCodec + ?Sized>(&self, store: &S) -> Result<ArtifactHandle> {
        store.store(&self.state())
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
}

impl<V: CanonicalBytes + ?Sized> BloomFilter<V> for ExclusiveBloomFilter {
    #[inline]
    fn add(&mut self, value: &V) {
        ExclusiveBloomFilter::add(self, value);
    }

    #[inline]
    fn check(&self, value: &V) -> bool {
        ExclusiveBloomFilter::check(self, value)
    }

    fn reset(&mut self) {
        ExclusiveBloomFilter::reset(self);
    }

    fn union(&mut self, other: &FilterState) -> bool {
        ExclusiveBloomFilter::union(self, other)
    }

    fn state(&self) -> FilterState {
        ExclusiveBloomFilter::state(self)
    }

    fn params(&self) -> &FilterParams {
        &self.params
    }

    fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }
}
