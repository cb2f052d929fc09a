//! Value encoding, hashing and index derivation.
//!
//! # Module Structure
//!
//! ```text
//! hash/
//! ├── codec.rs       - CanonicalBytes: value → deterministic bytes
//! ├── hasher.rs      - BloomHasher trait and the seeded XXH3 hasher
//! ├── strategies.rs  - Double hashing and IndexDeriver
//! └── mod.rs         - This file (public API)
//! ```
//!
//! The pipeline for every `add`/`check` is:
//!
//! ```text
//! value ──CanonicalBytes──► bytes ──BloomHasher×2──► (h1, h2) ──DoubleHashing──► [idx; k]
//! ```
//!
//! # Examples
//!
//! ```
//! use bloomsync::core::{FilterParams, Seeds};
//! use bloomsync::hash::{DoubleHashing, IndexDeriver};
//!
//! // Raw strategy
//! let indices = DoubleHashing.generate_indices(10, 3, 4, 100);
//! assert_eq!(indices, vec![10, 13, 16, 19]);
//!
//! // Full pipeline
//! let params = FilterParams::new("users", 4096, 4, Seeds::DEFAULT).unwrap();
//! let deriver = IndexDeriver::new(&params);
//! assert_eq!(deriver.derive_value(&42u32).len(), 4);
//! ```

pub mod codec;
pub mod hasher;
pub mod strategies;

pub use codec::{CanonicalBytes, Stringified};
#[cfg(feature = "serde")]
pub use codec::Structured;
pub use hasher::{BloomHasher, XxHasher};
pub use strategies::{DoubleHashing, IndexDeriver};

/// Hasher used by every filter variant.
pub type DefaultHasher = XxHasher;
