//! Core types, traits and sizing math.
//!
//! # Module Organization
//!
//! ```text
//! core/
//! ├── filter.rs    - BloomFilter / SharedBloomFilter traits, FilterState
//! ├── bitvec.rs    - BitField and AtomicBitField packed storage
//! ├── params.rs    - FilterParams, Seeds, sizing and estimation functions
//! └── mod.rs       - This file (public API)
//! ```
//!
//! # Examples
//!
//! ```
//! use bloomsync::core::{compute_optimal_parameters, estimate_false_positive_probability};
//!
//! let (bits, hashes) = compute_optimal_parameters(10_000, 0.001);
//! let p = estimate_false_positive_probability(bits, hashes, 10_000);
//! assert!(p < 0.0015);
//! ```

pub mod bitvec;
pub mod filter;
pub mod params;

pub use bitvec::{AtomicBitField, BitField};
pub use filter::{BloomFilter, FilterState, SharedBloomFilter};
pub use params::{
    compute_optimal_parameters, estimate_additions, estimate_current_rate,
    estimate_false_positive_probability, optimal_num_hashes, words_for_bits, FilterParams, Seeds,
    DEFAULT_FALSE_POSITIVE_RATE, WORD_BITS,
};
