//! Fluent construction of any filter variant.
//!
//! A filter is sized either explicitly, with [`num_bits`](BloomFilterBuilder::num_bits)
//! and [`num_hashes`](BloomFilterBuilder::num_hashes), or from a workload, with
//! [`expected_items`](BloomFilterBuilder::expected_items) and an optional
//! [`false_positive_rate`](BloomFilterBuilder::false_positive_rate). When both are
//! given, explicit values win and the workload fills in whichever is missing.
//!
//! | Given                              | `num_bits`         | `num_hashes`         |
//! |------------------------------------|--------------------|----------------------|
//! | bits + hashes                      | as given           | as given             |
//! | expected items (+ rate)            | optimal            | optimal              |
//! | expected items (+ rate) + bits     | as given           | optimal for the bits |
//! | expected items (+ rate) + hashes   | optimal            | as given             |
//! | anything else                      | error              | error                |
//!
//! # Examples
//!
//! ```
//! use bloomsync::builder::BloomFilterBuilder;
//!
//! let filter = BloomFilterBuilder::new()
//!     .id("users")
//!     .expected_items(10_000)
//!     .false_positive_rate(0.001)
//!     .num_shards(16)
//!     .build_sharded()
//!     .unwrap();
//!
//! filter.add("alice");
//! assert!(filter.check("alice"));
//! assert_eq!(filter.shard_count(), 16);
//! ```
//!
//! ## Error Handling
//!
//! ```
//! use bloomsync::builder::BloomFilterBuilder;
//!
//! // Neither a bit count nor a workload
//! assert!(BloomFilterBuilder::new().build_lock_free().is_err());
//! ```

#![allow(clippy::module_name_repetitions)]

use crate::core::params::{self, FilterParams, Seeds, DEFAULT_FALSE_POSITIVE_RATE};
use crate::error::{BloomSyncError, Result};
use crate::filters::ExclusiveBloomFilter;
use crate::sync::{
    GlobalLockBloomFilter, LockFreeBloomFilter, ShardedBloomFilter, DEFAULT_NUM_SHARDS,
};

/// Id given to filters built without one.
pub const DEFAULT_ID: &str = "bloom";

/// Collects filter configuration and builds any of the four variants.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilterBuilder {
    id: String,
    num_bits: Option<usize>,
    num_hashes: Option<usize>,
    expected_items: Option<usize>,
    false_positive_rate: f64,
    seeds: Seeds,
    num_shards: usize,
}

impl BloomFilterBuilder {
    /// Builder with the default id, seeds, rate and shard count, and no size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            num_bits: None,
            num_hashes: None,
            expected_items: None,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            seeds: Seeds::DEFAULT,
            num_shards: DEFAULT_NUM_SHARDS,
        }
    }

    /// Persistence key of the filter.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Exact number of bits.
    #[must_use]
    pub fn num_bits(mut self, num_bits: usize) -> Self {
        self.num_bits = Some(num_bits);
        self
    }

    /// Exact number of hash positions per value.
    #[must_use]
    pub fn num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = Some(num_hashes);
        self
    }

    /// Number of distinct values the filter is sized for.
    #[must_use]
    pub fn expected_items(mut self, items: usize) -> Self {
        self.expected_items = Some(items);
        self
    }

    /// Target false positive rate for workload sizing.
    ///
    /// Values outside `(0, 1]` fall back to 1% with a logged warning at build time.
    #[must_use]
    pub fn false_positive_rate(mut self, rate: f64) -> Self {
        self.false_positive_rate = rate;
        self
    }

    /// Hash seeds.
    #[must_use]
    pub fn seeds(mut self, seeds: impl Into<Seeds>) -> Self {
        self.seeds = seeds.into();
        self
    }

    /// Shard count for [`build_sharded`](Self::build_sharded). Ignored otherwise.
    #[must_use]
    pub fn num_shards(mut self, num_shards: usize) -> Self {
        self.num_shards = num_shards;
        self
    }

    /// Resolve the configuration into validated parameters.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidParameters`] if the size is under-specified or a
    /// resolved count is zero.
    pub fn params(&self) -> Result<FilterParams> {
        let (num_bits, num_hashes) = match (self.num_bits, self.num_hashes, self.expected_items) {
            (Some(bits), Some(hashes), _) => (bits, hashes),
            (bits, hashes, Some(items)) => {
                let (optimal_bits, optimal_hashes) =
                    params::compute_optimal_parameters(items, self.false_positive_rate);
                match (bits, hashes) {
                    (Some(bits), None) => (bits, params::optimal_num_hashes(bits, items)),
                    (None, Some(hashes)) => (optimal_bits, hashes),
                    _ => (optimal_bits, optimal_hashes),
                }
            }
            _ => {
                return Err(BloomSyncError::invalid_parameters(
                    "set num_bits and num_hashes, or expected_items",
                ))
            }
        };
        FilterParams::new(self.id.clone(), num_bits, num_hashes, self.seeds)
    }

    /// Build an [`ExclusiveBloomFilter`].
    ///
    /// # Errors
    ///
    /// As [`params`](Self::params).
    pub fn build_exclusive(&self) -> Result<ExclusiveBloomFilter> {
        Ok(ExclusiveBloomFilter::from_params(self.params()?))
    }

    /// Build a [`GlobalLockBloomFilter`].
    ///
    /// # Errors
    ///
    /// As [`params`](Self::params).
    pub fn build_global_lock(&self) -> Result<GlobalLockBloomFilter> {
        Ok(GlobalLockBloomFilter::from_params(self.params()?))
    }

    /// Build a [`LockFreeBloomFilter`].
    ///
    /// # Errors
    ///
    /// As [`params`](Self::params).
    pub fn build_lock_free(&self) -> Result<LockFreeBloomFilter> {
        Ok(LockFreeBloomFilter::from_params(self.params()?))
    }

    /// Build a [`ShardedBloomFilter`] with the configured shard count.
    ///
    /// # Errors
    ///
    /// As [`params`](Self::params), or
    /// [`BloomSyncError::InvalidShardCount`] if the shard count is zero.
    pub fn build_sharded(&self) -> Result<ShardedBloomFilter> {
        ShardedBloomFilter::from_params(self.params()?, self.num_shards)
    }
}

impl Default for BloomFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
