//! Balanced partition of a bit range into shards.
//!
//! `[0, num_bits)` is split into `num_shards` contiguous, non-overlapping ranges
//! whose lengths differ by at most one:
//!
//! ```text
//! long     = ⌈num_bits / num_shards⌉
//! short    = ⌊num_bits / num_shards⌋
//! num_long = num_bits mod num_shards          (shards of length `long`, first)
//! boundary = num_long × long
//!
//! shard_of(i) = i / long                              if i <  boundary
//!             = num_long + (i - boundary) / short     if i >= boundary
//! ```
//!
//! A request for more shards than bits is clamped to `num_bits`, so `short >= 1` and
//! no shard is ever empty.
//!
//! # Examples
//!
//! ```
//! use bloomsync::sync::ShardLayout;
//!
//! // 10 bits over 4 shards: lengths 3, 3, 2, 2
//! let layout = ShardLayout::new(10, 4).unwrap();
//! assert_eq!(layout.shard_range(0), 0..3);
//! assert_eq!(layout.shard_range(1), 3..6);
//! assert_eq!(layout.shard_range(2), 6..8);
//! assert_eq!(layout.shard_range(3), 8..10);
//! assert_eq!(layout.shard_of(5), 1);
//! assert_eq!(layout.shard_of(6), 2);
//! ```

use crate::error::{BloomSyncError, Result};
use std::ops::Range;

/// Maps bit indices to the shard that owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLayout {
    num_bits: usize,
    num_shards: usize,
    long_len: usize,
    short_len: usize,
    num_long: usize,
    boundary: usize,
}

impl ShardLayout {
    /// Partition `num_bits` bits into `requested_shards` shards.
    ///
    /// # Errors
    ///
    /// - [`BloomSyncError::InvalidShardCount`] if `requested_shards == 0`.
    /// - [`BloomSyncError::InvalidParameters`] if `num_bits == 0`.
    pub fn new(num_bits: usize, requested_shards: usize) -> Result<Self> {
        if requested_shards == 0 {
            return Err(BloomSyncError::invalid_shard_count(requested_shards));
        }
        if num_bits == 0 {
            return Err(BloomSyncError::invalid_parameters(
                "cannot shard a zero-bit filter",
            ));
        }

        let num_shards = requested_shards.min(num_bits);
        if num_shards < requested_shards {
            tracing::debug!(
                requested = requested_shards,
                clamped = num_shards,
                num_bits,
                "shard count clamped to bit count"
            );
        }

        let short_len = num_bits / num_shards;
        let num_long = num_bits % num_shards;
        let long_len = if num_long == 0 { short_len } else { short_len + 1 };

        Ok(Self {
            num_bits,
            num_shards,
            long_len,
            short_len,
            num_long,
            boundary: num_long * long_len,
        })
    }

    /// Number of shards after clamping.
    #[must_use]
    #[inline]
    pub const fn num_shards(&self) -> usize {
        self.num_shards
    }

    /// Number of bits partitioned.
    #[must_use]
    #[inline]
    pub const fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Shard owning bit `index`.
    ///
    /// `index` must be below `num_bits`; larger values map past the last shard.
    #[must_use]
    #[inline]
    pub fn shard_of(&self, index: usize) -> usize {
        debug_assert!(index < self.num_bits, "index {} out of range", index);
        if index < self.boundary {
            index / self.long_len
        } else {
            self.num_long + (index - self.boundary) / self.short_len
        }
    }

    /// Bit range owned by `shard`.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= num_shards`.
    #[must_use]
    pub fn shard_range(&self, shard: usize) -> Range<usize> {
        assert!(
            shard < self.num_shards,
            "shard {} out of range ({} shards)",
            shard,
            self.num_shards
        );
        if shard < self.num_long {
            let start = shard * self.long_len;
            start..start + self.long_len
        } else {
            let start = self.boundary + (shard - self.num_long) * self.short_len;
            start..start + self.short_len
        }
    }

    /// Length of `shard`'s range.
    #[must_use]
    pub fn shard_len(&self, shard: usize) -> usize {
        self.shard_range(shard).len()
    }

    /// All shard ranges in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.num_shards).map(move |s| self.shard_range(s))
    }
}
