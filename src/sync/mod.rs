//! Internally synchronized Bloom filters.
//!
//! All three filters here share one packed bit array per filter, mutate through
//! `&self`, and implement both [`BloomFilter`](crate::core::BloomFilter) and
//! [`SharedBloomFilter`](crate::core::SharedBloomFilter). They differ only in how
//! they serialize access to the bits:
//!
//! - [`GlobalLockBloomFilter`] - one reader-writer lock around the whole field
//! - [`LockFreeBloomFilter`] - atomic words, compare-and-swap per bit, no locks
//! - [`ShardedBloomFilter`] - the bit range split by [`ShardLayout`], one lock per
//!   shard, held for a single bit at a time
//!
//! # Blocking Behaviour
//!
//! | Filter      | `add`                         | `check`                      | `reset` / `union`            |
//! |-------------|-------------------------------|------------------------------|------------------------------|
//! | GlobalLock  | exclusive lock, whole call    | shared lock, whole call      | exclusive lock, whole call   |
//! | LockFree    | never blocks                  | never blocks                 | never blocks                 |
//! | Sharded     | one shard lock per bit        | one shard lock per bit       | each shard lock in turn      |
//!
//! Under every filter, the bits after a set of completed `add` calls are the union
//! of the bits each call sets on its own: no update is ever lost.
//!
//! For LockFree and Sharded, one `add` is `k` independent bit operations, so a
//! concurrent `check` of the same value may return `false` until that `add`
//! returns. Once it has returned, `check` is `true`.
//!
//! # Examples
//!
//! ```
//! use bloomsync::sync::{GlobalLockBloomFilter, LockFreeBloomFilter, ShardedBloomFilter};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = Arc::new(LockFreeBloomFilter::new("events", 1 << 16, 5).unwrap());
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|t| {
//!         let filter = Arc::clone(&filter);
//!         thread::spawn(move || {
//!             for i in 0..250u64 {
//!                 filter.add(&(t * 250 + i));
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert!((0..1000u64).all(|i| filter.check(&i)));
//!
//! // The same bits under any strategy
//! let global = GlobalLockBloomFilter::from_state(&filter.state());
//! let sharded = ShardedBloomFilter::from_state(&filter.state(), 32).unwrap();
//! assert_eq!(global.state(), sharded.state());
//! ```

/// Inherent convenience methods plus both trait impls for a synchronized filter.
///
/// The type must provide inherent `add`, `check`, `reset`, `union`, `state`,
/// `params` and `count_ones` taking `&self`. Inherent methods keep calls on the
/// concrete type unambiguous when both traits are in scope.
macro_rules! impl_synchronized_filter {
    ($ty:ident) => {
        impl $ty {
            /// Add every value.
            pub fn add_batch<'a, V, I>(&self, values: I)
            where
                V: $crate::hash::CanonicalBytes + ?Sized + 'a,
                I: IntoIterator<Item = &'a V>,
            {
                for value in values {
                    self.add(value);
                }
            }

            /// `true` if every value checks positive.
            #[must_use]
            pub fn check_all<'a, V, I>(&self, values: I) -> bool
            where
                V: $crate::hash::CanonicalBytes + ?Sized + 'a,
                I: IntoIterator<Item = &'a V>,
            {
                values.into_iter().all(|value| self.check(value))
            }

            /// `true` if any value checks positive.
            #[must_use]
            pub fn check_any<'a, V, I>(&self, values: I) -> bool
            where
                V: $crate::hash::CanonicalBytes + ?Sized + 'a,
                I: IntoIterator<Item = &'a V>,
            {
                values.into_iter().any(|value| self.check(value))
            }

            /// [`union`](Self::union) returning an error that names the mismatch.
            ///
            /// # Errors
            ///
            /// [`BloomSyncError::IncompatibleFilters`](crate::BloomSyncError::IncompatibleFilters).
            pub fn try_union(&self, other: &$crate::core::FilterState) -> $crate::Result<()> {
                if let Some(reason) = self.params().incompatibility(other.params()) {
                    return Err($crate::BloomSyncError::incompatible_filters(reason));
                }
                self.union(other);
                Ok(())
            }

            /// Union with another filter of the same kind, through a snapshot of it.
            pub fn union_with(&self, other: &Self) -> bool {
                self.union(&other.state())
            }

            /// Persistence key.
            #[must_use]
            pub fn id(&self) -> &str {
                self.params().id()
            }

            /// Addressable bits.
            #[must_use]
            pub fn num_bits(&self) -> usize {
                self.params().num_bits()
            }

            /// Bits touched per value.
            #[must_use]
            pub fn num_hashes(&self) -> usize {
                self.params().num_hashes()
            }

            /// The seed pair.
            #[must_use]
            pub fn seeds(&self) -> $crate::core::Seeds {
                self.params().seeds()
            }

            /// False positive estimate from the current fill.
            #[must_use]
            pub fn estimated_false_positive_rate(&self) -> f64 {
                $crate::core::params::estimate_current_rate(
                    self.num_bits(),
                    self.num_hashes(),
                    self.count_ones(),
                )
            }

            /// `true` if no bit is set.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.count_ones() == 0
            }

            /// Persist the current state.
            ///
            /// # Errors
            ///
            /// Whatever the store reports.
            pub fn save<S: $crate::persist::PersistenceCodec + ?Sized>(
                &self,
                store: &S,
            ) -> $crate::Result<$crate::persist::ArtifactHandle> {
                store.store(&self.state())
            }
        }

        impl<V: $crate::hash::CanonicalBytes + ?Sized> $crate::core::BloomFilter<V> for $ty {
            #[inline]
            fn add(&mut self, value: &V) {
                $ty::add(self, value);
            }

            #[inline]
            fn check(&self, value: &V) -> bool {
                $ty::check(self, value)
            }

            fn reset(&mut self) {
                $ty::reset(self);
            }

            fn union(&mut self, other: &$crate::core::FilterState) -> bool {
                $ty::union(self, other)
            }

            fn state(&self) -> $crate::core::FilterState {
                $ty::state(self)
            }

            fn params(&self) -> &$crate::core::FilterParams {
                $ty::params(self)
            }

            fn count_ones(&self) -> usize {
                $ty::count_ones(self)
            }
        }

        impl<V: $crate::hash::CanonicalBytes + ?Sized> $crate::core::SharedBloomFilter<V> for $ty {
            #[inline]
            fn add(&self, value: &V) {
                $ty::add(self, value);
            }

            #[inline]
            fn check(&self, value: &V) -> bool {
                $ty::check(self, value)
            }

            fn reset(&self) {
                $ty::reset(self);
            }

            fn union(&self, other: &$crate::core::FilterState) -> bool {
                $ty::union(self, other)
            }

            fn state(&self) -> $crate::core::FilterState {
                $ty::state(self)
            }

            fn params(&self) -> &$crate::core::FilterParams {
                $ty::params(self)
            }

            fn count_ones(&self) -> usize {
                $ty::count_ones(self)
            }
        }
    };
}

mod global_lock;
pub mod layout;
mod lock_free;
mod sharded;

pub use global_lock::GlobalLockBloomFilter;
pub use layout::ShardLayout;
pub use lock_free::LockFreeBloomFilter;
pub use sharded::{ShardedBloomFilter, DEFAULT_NUM_SHARDS};
