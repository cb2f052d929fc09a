//! bloomsync: Bloom filters over one packed bit array, with interchangeable
//! concurrency strategies.
//!
//! Every filter stores `num_bits` bits in 64-bit words and maps a value to
//! `num_hashes` bit positions by seeded double hashing. The four variants compute
//! identical bits for identical inputs and differ only in how they make the bit
//! array safe to use:
//!
//! | Filter                    | Mutation    | Synchronization                         |
//! |---------------------------|-------------|-----------------------------------------|
//! | [`ExclusiveBloomFilter`]  | `&mut self` | none, single owner                      |
//! | [`GlobalLockBloomFilter`] | `&self`     | one reader-writer lock                  |
//! | [`LockFreeBloomFilter`]   | `&self`     | atomic words, compare-and-swap per bit  |
//! | [`ShardedBloomFilter`]    | `&self`     | one lock per shard of the bit range     |
//!
//! A Bloom filter may report a value it never saw (a false positive) but never
//! misses one it did see.
//!
//! # Quick Start
//!
//! ```
//! use bloomsync::ExclusiveBloomFilter;
//!
//! let mut filter = ExclusiveBloomFilter::new("words", 10_000, 4).unwrap();
//! filter.add("hello");
//! filter.add(&42u64);
//!
//! assert!(filter.check("hello"));
//! assert!(filter.check(&42u64));
//! assert!(!filter.check("goodbye"));
//! ```
//!
//! # Sharing Across Threads
//!
//! ```
//! use bloomsync::builder::BloomFilterBuilder;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = Arc::new(
//!     BloomFilterBuilder::new()
//!         .id("requests")
//!         .expected_items(4_000)
//!         .false_positive_rate(0.01)
//!         .build_lock_free()
//!         .unwrap(),
//! );
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|t| {
//!         let filter = Arc::clone(&filter);
//!         thread::spawn(move || {
//!             for i in 0..1_000u64 {
//!                 filter.add(&(t * 1_000 + i));
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//! assert!((0..4_000u64).all(|i| filter.check(&i)));
//! ```
//!
//! # Merging and Persistence
//!
//! Filters exchange their bits as a [`FilterState`]. Any variant can union in the
//! state of any other, provided `num_bits`, `num_hashes` and the seeds match.
//!
//! ```
//! use bloomsync::prelude::*;
//!
//! let mut local = ExclusiveBloomFilter::new("seen", 4096, 3).unwrap();
//! let shared = ShardedBloomFilter::new("seen", 4096, 3, 8).unwrap();
//! local.add("a");
//! shared.add("b");
//!
//! assert!(shared.union(&local.state()));
//! assert!(shared.check("a") && shared.check("b"));
//!
//! let store = MemoryStore::new();
//! shared.save(&store).unwrap();
//! let restored = GlobalLockBloomFilter::load("seen", &store).unwrap();
//! assert_eq!(restored.state(), shared.state());
//! ```
//!
//! # Features
//!
//! - `serde` (default): serde derives for parameters and state, [`persist::FileStore`],
//!   and [`hash::Structured`] values
//! - `rayon`: `par_add_batch` / `par_check_all` on [`SharedBloomFilter`]
//!
//! # Logging
//!
//! The crate emits `tracing` events (construction, shard clamping, rejected unions,
//! persistence at `debug`; substituted false positive rates at `warn`) and never
//! installs a subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Core data structures, traits and sizing math
pub mod core;

/// Error types and result aliases
pub mod error;

/// Single-owner filters
pub mod filters;

/// Value encoding, hash functions and index derivation
pub mod hash;

/// Internally synchronized filters
pub mod sync;

/// Fluent configuration for every variant
pub mod builder;

/// Durable filter state
pub mod persist;

pub use error::{BloomSyncError, Result};

pub use core::filter::{BloomFilter, FilterState, SharedBloomFilter};
pub use core::params::{FilterParams, Seeds};

pub use filters::ExclusiveBloomFilter;
pub use sync::{GlobalLockBloomFilter, LockFreeBloomFilter, ShardLayout, ShardedBloomFilter};

pub use builder::BloomFilterBuilder;
pub use hash::CanonicalBytes;
pub use persist::{ArtifactHandle, PersistenceCodec};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use bloomsync::prelude::*;
///
/// let filter = LockFreeBloomFilter::new("p", 1000, 3).unwrap();
/// filter.add("hello");
/// assert!(filter.check("hello"));
/// ```
pub mod prelude {
    pub use crate::builder::BloomFilterBuilder;
    pub use crate::core::filter::{BloomFilter, FilterState, SharedBloomFilter};
    pub use crate::core::params::{compute_optimal_parameters, FilterParams, Seeds};
    pub use crate::error::{BloomSyncError, Result};
    pub use crate::filters::ExclusiveBloomFilter;
    pub use crate::hash::{CanonicalBytes, Stringified};
    pub use crate::persist::{ArtifactHandle, MemoryStore, PersistenceCodec};
    pub use crate::sync::{GlobalLockBloomFilter, LockFreeBloomFilter, ShardedBloomFilter};

    #[cfg(feature = "serde")]
    pub use crate::hash::Structured;

    #[cfg(feature = "serde")]
    pub use crate::persist::{ArtifactFormat, FileStore};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_prelude_imports() {
        let mut filter = ExclusiveBloomFilter::new("p", 100, 2).unwrap();
        filter.add("test");
        assert!(filter.check("test"));
    }

    #[test]
    fn test_exclusive_trait_usage() {
        fn exercise<F: BloomFilter<str>>(filter: &mut F) {
            filter.add("item");
            assert!(filter.check("item"));
        }

        let mut exclusive = ExclusiveBloomFilter::new("t", 512, 3).unwrap();
        let mut global = GlobalLockBloomFilter::new("t", 512, 3).unwrap();
        exercise(&mut exclusive);
        exercise(&mut global);
        assert_eq!(exclusive.state(), global.state());
    }

    #[test]
    fn test_shared_trait_across_threads() {
        fn share<F: SharedBloomFilter<u64> + 'static>(filter: F) -> Arc<F> {
            let filter = Arc::new(filter);
            let clone = Arc::clone(&filter);
            std::thread::spawn(move || clone.add(&7))
                .join()
                .unwrap();
            filter
        }

        assert!(share(LockFreeBloomFilter::new("s", 256, 2).unwrap()).check(&7u64));
        assert!(share(ShardedBloomFilter::new("s", 256, 2, 4).unwrap()).check(&7u64));
    }

    #[test]
    fn test_cross_variant_union() {
        let mut exclusive = ExclusiveBloomFilter::new("x", 1024, 3).unwrap();
        let lock_free = LockFreeBloomFilter::new("y", 1024, 3).unwrap();
        lock_free.add("from lock-free");
        assert!(exclusive.union(&lock_free.state()));
        assert!(exclusive.check("from lock-free"));
    }
}
