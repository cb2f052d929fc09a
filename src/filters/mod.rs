//! Single-owner Bloom filters.
//!
//! [`ExclusiveBloomFilter`] mutates through `&mut self` and carries no
//! synchronization. Share it across threads only behind external exclusion; for
//! internally synchronized filters see [`crate::sync`].
//!
//! # Examples
//!
//! ```
//! use bloomsync::filters::ExclusiveBloomFilter;
//!
//! let mut filter = ExclusiveBloomFilter::new("words", 4096, 3).unwrap();
//! filter.add("hello");
//! assert!(filter.check("hello"));
//! assert!(!filter.check("goodbye"));
//! ```

pub mod exclusive;

pub use exclusive::ExclusiveBloomFilter;
