//! Index derivation by double hashing.
//!
//! Two base hashes are reduced into `[0, m)` and combined linearly:
//!
//! ```text
//! h1 = hash(seed1, data) mod m
//! h2 = hash(seed2, data) mod m
//! index_i = (h1 + i × h2) mod m        for i in 0..k
//! ```
//!
//! The arithmetic is carried out in `u128` so that no intermediate value wraps,
//! whatever the magnitude of `m`, `k` or the raw hashes.
//!
//! # References
//!
//! - Kirsch & Mitzenmacher (2006): "Less Hashing, Same Performance: Building a Better Bloom Filter"

use super::codec::CanonicalBytes;
use super::hasher::{BloomHasher, XxHasher};
use crate::core::params::{FilterParams, Seeds};

/// Plain double hashing: `(h1 + i × h2) mod m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleHashing;

impl DoubleHashing {
    /// Generate `k` indices in `[0, m)` from two raw base hashes.
    ///
    /// Both base hashes are reduced modulo `m` before combination.
    ///
    /// # Panics
    ///
    /// Panics if `m == 0`.
    #[inline]
    #[must_use]
    pub fn generate_indices(&self, h1: u64, h2: u64, k: usize, m: usize) -> Vec<usize> {
        assert!(m > 0, "cannot derive indices for a zero-bit filter");

        let m = m as u128;
        let h1 = u128::from(h1) % m;
        let h2 = u128::from(h2) % m;

        (0..k as u128)
            .map(|i| ((h1 + (i * h2) % m) % m) as usize)
            .collect()
    }
}

/// Maps canonical bytes to the ordered list of bit positions a filter touches.
///
/// The deriver is a pure function of `(data, num_bits, num_hashes, seeds)`: it has no
/// side effects, performs no I/O and never blocks.
///
/// # Examples
///
/// ```
/// use bloomsync::core::{FilterParams, Seeds};
/// use bloomsync::hash::IndexDeriver;
///
/// let params = FilterParams::new("idx", 1024, 5, Seeds::DEFAULT).unwrap();
/// let deriver = IndexDeriver::new(&params);
///
/// let first = deriver.derive_value("some value");
/// let second = deriver.derive_value("some value");
/// assert_eq!(first, second);
/// assert_eq!(first.len(), 5);
/// assert!(first.iter().all(|&i| i < 1024));
/// ```
#[derive(Debug, Clone)]
pub struct IndexDeriver<H = XxHasher> {
    num_bits: usize,
    num_hashes: usize,
    seeds: Seeds,
    hasher: H,
    strategy: DoubleHashing,
}

impl IndexDeriver<XxHasher> {
    /// Deriver for `params` using the default XXH3 hasher.
    #[must_use]
    pub fn new(params: &FilterParams) -> Self {
        Self::with_hasher(params, XxHasher)
    }
}

impl<H: BloomHasher> IndexDeriver<H> {
    /// Deriver for `params` using an explicit hasher.
    #[must_use]
    pub fn with_hasher(params: &FilterParams, hasher: H) -> Self {
        Self {
            num_bits: params.num_bits(),
            num_hashes: params.num_hashes(),
            seeds: params.seeds(),
            hasher,
            strategy: DoubleHashing,
        }
    }

    /// Indices for already-canonical bytes.
    #[inline]
    #[must_use]
    pub fn derive(&self, data: &[u8]) -> Vec<usize> {
        let (h1, h2) = self.hasher.hash_pair(data, self.seeds);
        self.strategy
            .generate_indices(h1, h2, self.num_hashes, self.num_bits)
    }

    /// Indices for a value, encoding it first.
    #[inline]
    #[must_use]
    pub fn derive_value<V: CanonicalBytes + ?Sized>(&self, value: &V) -> Vec<usize> {
        self.derive(&value.canonical_bytes())
    }

    /// Name of the underlying hash function.
    #[must_use]
    pub fn hasher_name(&self) -> &'static str {
        self.hasher.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always returns the same raw value, regardless of input.
    struct FixedHasher(u64);

    impl BloomHasher for FixedHasher {
        fn hash_with_seed(&self, _bytes: &[u8], seed: u64) -> u64 {
            self.0.wrapping_sub(seed)
        }

        fn name(&self) -> &'static str {
            "Fixed"
        }
    }

    fn params(bits: usize, hashes: usize) -> FilterParams {
        FilterParams::new("test", bits, hashes, Seeds::DEFAULT).unwrap()
    }

    #[test]
    fn test_double_hashing_basic() {
        let indices = DoubleHashing.generate_indices(3, 5, 4, 100);
        assert_eq!(indices, vec![3, 8, 13, 18]);
    }

    #[test]
    fn test_double_hashing_wraps_modulo_m() {
        let indices = DoubleHashing.generate_indices(9, 7, 3, 10);
        assert_eq!(indices, vec![9, 6, 3]);
    }

    #[test]
    fn test_double_hashing_reduces_base_hashes_by_m() {
        // h1 = 1003 mod 100 = 3, h2 = 205 mod 100 = 5
        let indices = DoubleHashing.generate_indices(1003, 205, 4, 100);
        assert_eq!(indices, vec![3, 8, 13, 18]);
    }

    #[test]
    fn test_double_hashing_extreme_values_stay_in_range() {
        for m in [1usize, 2, 63, 64, 65, 1_000_003, usize::MAX] {
            let indices = DoubleHashing.generate_indices(u64::MAX, u64::MAX - 1, 64, m);
            assert_eq!(indices.len(), 64);
            assert!(indices.iter().all(|&i| i < m), "m={}", m);
        }
    }

    #[test]
    #[should_panic(expected = "zero-bit filter")]
    fn test_double_hashing_zero_bits_panics() {
        let _ = DoubleHashing.generate_indices(1, 2, 3, 0);
    }

    #[test]
    fn test_deriver_length_and_range() {
        let deriver = IndexDeriver::new(&params(1024, 7));
        for i in 0..500u64 {
            let indices = deriver.derive_value(&i);
            assert_eq!(indices.len(), 7);
            assert!(indices.iter().all(|&idx| idx < 1024));
        }
    }

    #[test]
    fn test_deriver_deterministic_across_instances() {
        let a = IndexDeriver::new(&params(4096, 4));
        let b = IndexDeriver::new(&params(4096, 4));
        assert_eq!(a.derive(b"value"), b.derive(b"value"));
    }

    #[test]
    fn test_deriver_depends_on_seeds() {
        let a = IndexDeriver::new(&params(1 << 20, 4));
        let other = FilterParams::new("test", 1 << 20, 4, Seeds::new(1, 2)).unwrap();
        let b = IndexDeriver::new(&other);
        assert_ne!(a.derive(b"value"), b.derive(b"value"));
    }

    #[test]
    fn test_deriver_spans_full_bit_range() {
        // Reducing by num_hashes instead of num_bits would confine indices to a tiny prefix
        let deriver = IndexDeriver::new(&params(10_000, 3));
        let max = (0..1_000u32)
            .flat_map(|i| deriver.derive_value(&i))
            .max()
            .unwrap();
        assert!(max > 9_000, "max index {} suggests a narrowed range", max);
    }

    #[test]
    fn test_deriver_with_adversarial_hasher() {
        let deriver = IndexDeriver::with_hasher(&params(77, 16), FixedHasher(u64::MAX));
        let indices = deriver.derive(b"anything");
        assert_eq!(indices.len(), 16);
        assert!(indices.iter().all(|&i| i < 77));
        assert_eq!(deriver.hasher_name(), "Fixed");
    }

    #[test]
    fn test_deriver_golden_vectors() {
        // Fixed outputs of seeded XXH3-64 with the default seeds; these must never
        // change between builds, platforms or releases
        let small = IndexDeriver::new(&params(1000, 5));
        assert_eq!(small.derive(b"bloom"), vec![197, 800, 403, 6, 609]);
        assert_eq!(small.derive(b"hello, world"), vec![825, 915, 5, 95, 185]);
        assert_eq!(small.derive_value(&42u64), vec![912, 660, 408, 156, 904]);

        let large = IndexDeriver::new(&params(1 << 20, 7));
        assert_eq!(
            large.derive(b"bloom"),
            vec![634_357, 792_776, 951_195, 61_038, 219_457, 377_876, 536_295]
        );
    }

    #[test]
    fn test_single_bit_filter() {
        let deriver = IndexDeriver::new(&params(1, 5));
        assert_eq!(deriver.derive(b"x"), vec![0; 5]);
    }
}
