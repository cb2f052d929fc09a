//! Seeded hash functions for index derivation.
//!
//! Hash functions operate on byte slices produced by the value codec, so the hash
//! of a value never depends on `std::hash::Hash` implementations, pointer values or
//! per-process random state. The same bytes and seed give the same 64-bit output in
//! every process on every platform.
//!
//! # Examples
//!
//! ```
//! use bloomsync::core::Seeds;
//! use bloomsync::hash::{BloomHasher, XxHasher};
//!
//! let hasher = XxHasher;
//! let (h1, h2) = hasher.hash_pair(b"hello", Seeds::DEFAULT);
//! assert_eq!((h1, h2), hasher.hash_pair(b"hello", Seeds::DEFAULT));
//! assert_ne!(h1, h2);
//! ```

use crate::core::params::Seeds;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// A seeded, well-distributed, deterministic 64-bit hash over bytes.
///
/// Implementations need not be collision resistant, but the same `(bytes, seed)`
/// must always produce the same output, across calls and across processes.
pub trait BloomHasher: Send + Sync {
    /// Hash `bytes` under `seed`.
    fn hash_with_seed(&self, bytes: &[u8], seed: u64) -> u64;

    /// The two base hashes for double hashing, one per seed.
    #[inline]
    fn hash_pair(&self, bytes: &[u8], seeds: Seeds) -> (u64, u64) {
        (
            self.hash_with_seed(bytes, seeds.primary),
            self.hash_with_seed(bytes, seeds.secondary),
        )
    }

    /// Human-readable name for debugging.
    fn name(&self) -> &'static str;
}

/// XXH3-64 with an explicit seed (via `xxhash-rust`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XxHasher;

impl BloomHasher for XxHasher {
    #[inline]
    fn hash_with_seed(&self, bytes: &[u8], seed: u64) -> u64 {
        xxh3_64_with_seed(bytes, seed)
    }

    #[inline]
    fn name(&self) -> &'static str {
        "XXH3-64"
    }
}
