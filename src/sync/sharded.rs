//! Bloom filter with one lock per shard of the bit range.
//!
//! The bit range is partitioned by a [`ShardLayout`]. Each bit operation locks only
//! the shard that owns the bit, so writers touching different shards never wait on
//! each other.
//!
//! ## Locking Protocol
//!
//! | Operation    | Locks acquired                  | Lock type | Held for          |
//! |--------------|---------------------------------|-----------|-------------------|
//! | `add`        | owning shard, per derived bit   | write     | one bit           |
//! | `check`      | owning shard, per derived bit   | read      | one bit           |
//! | `reset`      | every shard, one at a time      | write     | that shard's range|
//! | `union`      | every shard, one at a time      | write     | that shard's range|
//! | `state`      | every shard, one at a time      | read      | that shard's range|
//!
//! No call holds two shard locks at once, so there is no lock ordering to get
//! wrong. `reset`, `union` and `state` are atomic per shard, not across the whole
//! filter: a concurrent `add` may land in a shard already visited or one not yet
//! visited.
//!
//! Shard boundaries need not fall on 64-bit word boundaries, so two shards may
//! share a word. The words are therefore atomic and every per-shard write is a
//! masked `fetch_or`/`fetch_and` or a CAS on that word.
//!
//! Each lock is padded to its own cache line to avoid false sharing between
//! neighbouring shards.

use super::layout::ShardLayout;
use crate::core::bitvec::AtomicBitField;
use crate::core::filter::FilterState;
use crate::core::params::{words_for_bits, FilterParams, Seeds};
use crate::error::Result;
use crate::hash::{CanonicalBytes, IndexDeriver};
use crate::persist::PersistenceCodec;
use parking_lot::RwLock;
use std::fmt;

/// Shard count used by the builder when none is given.
pub const DEFAULT_NUM_SHARDS: usize = 64;

/// Cache-line-aligned lock guarding one shard's bit range.
#[repr(align(64))]
struct PaddedRwLock {
    lock: RwLock<()>,
}

impl PaddedRwLock {
    const fn new() -> Self {
        Self {
            lock: RwLock::new(()),
        }
    }
}

/// Bloom filter whose bit range is split into independently locked shards.
///
/// # Examples
///
/// ```
/// use bloomsync::sync::ShardedBloomFilter;
///
/// let filter = ShardedBloomFilter::new("sessions", 1 << 14, 4, 16).unwrap();
/// filter.add("session-42");
/// assert!(filter.check("session-42"));
/// assert_eq!(filter.shard_count(), 16);
/// ```
pub struct ShardedBloomFilter {
    params: FilterParams,
    deriver: IndexDeriver,
    layout: ShardLayout,
    shards: Box<[PaddedRwLock]>,
    bits: AtomicBitField,
}

impl ShardedBloomFilter {
    /// Create a filter with the default seeds.
    ///
    /// `num_shards` larger than `num_bits` is clamped to `num_bits`.
    ///
    /// # Errors
    ///
    /// - [`BloomSyncError::InvalidParameters`](crate::BloomSyncError::InvalidParameters)
    ///   if `num_bits` or `num_hashes` is zero.
    /// - [`BloomSyncError::InvalidShardCount`](crate::BloomSyncError::InvalidShardCount)
    ///   if `num_shards` is zero.
    pub fn new(
        id: impl Into<String>,
        num_bits: usize,
        num_hashes: usize,
        num_shards: usize,
    ) -> Result<Self> {
        Self::with_seeds(id, num_bits, num_hashes, Seeds::DEFAULT, num_shards)
    }

    /// Create a filter with explicit seeds.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_seeds(
        id: impl Into<String>,
        num_bits: usize,
        num_hashes: usize,
        seeds: Seeds,
        num_shards: usize,
    ) -> Result<Self> {
        let params = FilterParams::new(id, num_bits, num_hashes, seeds)?;
        Self::from_params(params, num_shards)
    }

    /// Create an empty filter from validated parameters.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidShardCount`](crate::BloomSyncError::InvalidShardCount)
    /// if `num_shards` is zero.
    pub fn from_params(params: FilterParams, num_shards: usize) -> Result<Self> {
        let layout = ShardLayout::new(params.num_bits(), num_shards)?;
        let shards = (0..layout.num_shards())
            .map(|_| PaddedRwLock::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::debug!(
            variant = "sharded",
            id = params.id(),
            num_bits = params.num_bits(),
            num_hashes = params.num_hashes(),
            num_shards = layout.num_shards(),
            "bloom filter created"
        );

        Ok(Self {
            bits: AtomicBitField::new(params.num_bits()),
            deriver: IndexDeriver::new(&params),
            layout,
            shards,
            params,
        })
    }

    /// Create a filter with `state`'s parameters and bits.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidShardCount`](crate::BloomSyncError::InvalidShardCount)
    /// if `num_shards` is zero.
    pub fn from_state(state: &FilterState, num_shards: usize) -> Result<Self> {
        let filter = Self::from_params(state.params().clone(), num_shards)?;
        filter.union(state);
        Ok(filter)
    }

    /// Restore a filter persisted under `id`.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::ArtifactNotFound`](crate::BloomSyncError::ArtifactNotFound)
    /// if nothing is stored under `id`, whatever else the store reports, or
    /// [`BloomSyncError::InvalidShardCount`](crate::BloomSyncError::InvalidShardCount).
    pub fn load<S: PersistenceCodec + ?Sized>(
        id: &str,
        store: &S,
        num_shards: usize,
    ) -> Result<Self> {
        Self::from_state(&store.load(id)?, num_shards)
    }

    /// Set the bits derived from `value`, locking each bit's shard in turn.
    pub fn add<V: CanonicalBytes + ?Sized>(&self, value: &V) {
        for idx in self.deriver.derive_value(value) {
            let _guard = self.shards[self.layout.shard_of(idx)].lock.write();
            self.bits.set_bit(idx);
        }
    }

    /// `true` if every bit derived from `value` is set.
    ///
    /// Stops at the first clear bit.
    #[must_use]
    pub fn check<V: CanonicalBytes + ?Sized>(&self, value: &V) -> bool {
        self.deriver.derive_value(value).into_iter().all(|idx| {
            let _guard = self.shards[self.layout.shard_of(idx)].lock.read();
            self.bits.test_bit(idx)
        })
    }

    /// Clear every bit, one shard at a time.
    pub fn reset(&self) {
        for (shard, range) in self.shards.iter().zip(self.layout.ranges()) {
            let _guard = shard.lock.write();
            self.bits.clear_range(range);
        }
    }

    /// OR-merge `other` if union-compatible, one shard at a time; returns whether
    /// it merged.
    pub fn union(&self, other: &FilterState) -> bool {
        if let Some(reason) = self.params.incompatibility(other.params()) {
            tracing::debug!(id = self.params.id(), other = other.params().id(), %reason, "union rejected");
            return false;
        }
        for (shard, range) in self.shards.iter().zip(self.layout.ranges()) {
            let _guard = shard.lock.write();
            self.bits.merge_range(other.words(), range);
        }
        true
    }

    /// Parameters and a copy of the raw words, read one shard at a time.
    #[must_use]
    pub fn state(&self) -> FilterState {
        let mut words = vec![0u64; words_for_bits(self.params.num_bits())];
        for (shard, range) in self.shards.iter().zip(self.layout.ranges()) {
            let _guard = shard.lock.read();
            self.bits.load_range_into(&mut words, range);
        }
        FilterState::from_parts(self.params.clone(), words)
    }

    /// The filter parameters.
    #[must_use]
    #[inline]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Number of set bits, counted over a shard-by-shard snapshot.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.state().count_ones()
    }

    /// Number of shards after clamping to the bit count.
    #[must_use]
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.layout.num_shards()
    }

    /// The partition of the bit range.
    #[must_use]
    #[inline]
    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    /// Approximate bytes used by the bits, the locks and the filter itself.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.bits.memory_usage()
            + self.shards.len() * std::mem::size_of::<PaddedRwLock>()
            + self.params.id().len()
            + std::mem::size_of::<Self>()
    }
}

impl_synchronized_filter!(ShardedBloomFilter);

impl fmt::Debug for ShardedBloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedBloomFilter")
            .field("id", &self.params.id())
            .field("num_bits", &self.params.num_bits())
            .field("num_hashes", &self.params.num_hashes())
            .field("num_shards", &self.layout.num_shards())
            .finish()
    }
}
