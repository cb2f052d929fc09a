//! Packed bit storage.
//!
//! Two backings share one layout: `⌈num_bits / 64⌉` words, bit `i` living in word
//! `i / 64` at offset `i % 64` (little-endian bit order within a word).
//!
//! ```text
//! Word 0: [bit 0][bit 1]...[bit 63]
//! Word 1: [bit 64][bit 65]...[bit 127]
//! ```
//!
//! - [`BitField`] owns plain `u64` words and needs `&mut self` to mutate. It has no
//!   synchronization of its own; the exclusive and global-lock filters put it
//!   behind ownership or a lock.
//! - [`AtomicBitField`] owns `AtomicU64` words and mutates through `&self`. The
//!   lock-free filter uses it directly; the sharded filter uses it under per-shard
//!   locks, because shard boundaries need not fall on word boundaries and two shards
//!   may share a word.
//!
//! Bits at positions `>= num_bits` in the final word are never set by any operation,
//! and [`BitField::from_words`] / [`AtomicBitField::from_words`] reject input that
//! sets them.
//!
//! # Memory Ordering
//!
//! - `AtomicBitField::set_bit` is a compare-and-swap loop (`AcqRel` on success,
//!   `Acquire` on failure) that returns as soon as the bit is observed set.
//! - `AtomicBitField::test_bit` is a single `Acquire` load, pairing with the
//!   release half of the CAS so a reader that sees a bit also sees everything the
//!   writer did before setting it.
//!
//! # Examples
//!
//! ```
//! use bloomsync::core::bitvec::{AtomicBitField, BitField};
//!
//! let mut plain = BitField::new(100);
//! plain.set_bit(42);
//! assert!(plain.test_bit(42));
//!
//! let shared = AtomicBitField::new(100);
//! assert!(shared.set_bit(7));
//! assert!(!shared.set_bit(7)); // already set
//! assert_eq!(shared.count_ones(), 1);
//! ```

use super::params::{words_for_bits, WORD_BITS};
use crate::error::{BloomSyncError, Result};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mask of the meaningful bits in the final word of a `num_bits`-bit field.
#[inline]
#[must_use]
pub(crate) const fn tail_mask(num_bits: usize) -> u64 {
    match num_bits % WORD_BITS {
        0 => u64::MAX,
        rem => (1u64 << rem) - 1,
    }
}

/// Mask of the bits of word `word` that fall inside `range`.
#[inline]
fn range_mask(word: usize, range: &Range<usize>) -> u64 {
    let word_start = word * WORD_BITS;
    let lo = range.start.max(word_start) - word_start;
    let hi = range.end.min(word_start + WORD_BITS) - word_start;
    if hi <= lo {
        0
    } else if hi - lo == WORD_BITS {
        u64::MAX
    } else {
        ((1u64 << (hi - lo)) - 1) << lo
    }
}

/// Indices of the words overlapping `range` (empty for an empty range).
#[inline]
fn words_of(range: &Range<usize>) -> Range<usize> {
    if range.is_empty() {
        0..0
    } else {
        range.start / WORD_BITS..(range.end - 1) / WORD_BITS + 1
    }
}

fn validate_words(words: &[u64], num_bits: usize) -> Result<()> {
    let expected = words_for_bits(num_bits);
    if words.len() != expected {
        return Err(BloomSyncError::invalid_state(format!(
            "{} bits need {} words, got {}",
            num_bits,
            expected,
            words.len()
        )));
    }
    if let Some(&last) = words.last() {
        if last & !tail_mask(num_bits) != 0 {
            return Err(BloomSyncError::invalid_state(format!(
                "bits beyond position {} are set in the final word",
                num_bits
            )));
        }
    }
    Ok(())
}

/// Plain packed bit array with no synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    words: Box<[u64]>,
    len: usize,
}

impl BitField {
    /// All-zero field of `num_bits` bits.
    #[must_use]
    pub fn new(num_bits: usize) -> Self {
        Self {
            words: vec![0u64; words_for_bits(num_bits)].into_boxed_slice(),
            len: num_bits,
        }
    }

    /// Adopt raw words.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidState`] if the word count is not `⌈num_bits/64⌉` or a
    /// tail bit is set.
    pub fn from_words(words: Vec<u64>, num_bits: usize) -> Result<Self> {
        validate_words(&words, num_bits)?;
        Ok(Self {
            words: words.into_boxed_slice(),
            len: num_bits,
        })
    }

    /// Number of addressable bits.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the field has no addressable bits.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read one bit.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[must_use]
    #[inline]
    pub fn test_bit(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "BitField index out of bounds: index={} len={}",
            index,
            self.len
        );
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Set one bit. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn set_bit(&mut self, index: usize) {
        assert!(
            index < self.len,
            "BitField index out of bounds: index={} len={}",
            index,
            self.len
        );
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    /// Zero every word.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// OR another field of the same length into this one.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn merge_or(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "BitField length mismatch in merge");
        self.merge_words(&other.words);
    }

    /// OR raw words into this field, ignoring anything beyond `len`.
    ///
    /// # Panics
    ///
    /// Panics if `words.len()` differs from this field's word count.
    pub fn merge_words(&mut self, words: &[u64]) {
        assert_eq!(
            self.words.len(),
            words.len(),
            "BitField word count mismatch in merge"
        );
        for (dst, src) in self.words.iter_mut().zip(words) {
            *dst |= *src;
        }
        if let Some(last) = self.words.last_mut() {
            *last &= tail_mask(self.len);
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The backing words.
    #[must_use]
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Copy of the backing words.
    #[must_use]
    pub fn to_words(&self) -> Vec<u64> {
        self.words.to_vec()
    }

    /// Heap plus inline bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>() + std::mem::size_of::<Self>()
    }
}

/// Packed bit array of atomic words, mutable through `&self`.
#[derive(Debug)]
pub struct AtomicBitField {
    words: Box<[AtomicU64]>,
    len: usize,
}

impl AtomicBitField {
    /// All-zero field of `num_bits` bits.
    #[must_use]
    pub fn new(num_bits: usize) -> Self {
        let words = (0..words_for_bits(num_bits))
            .map(|_| AtomicU64::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            words,
            len: num_bits,
        }
    }

    /// Adopt raw words.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidState`] if the word count is not `⌈num_bits/64⌉` or a
    /// tail bit is set.
    pub fn from_words(words: Vec<u64>, num_bits: usize) -> Result<Self> {
        validate_words(&words, num_bits)?;
        Ok(Self {
            words: words.into_iter().map(AtomicU64::new).collect(),
            len: num_bits,
        })
    }

    /// Number of addressable bits.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the field has no addressable bits.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read one bit with a single `Acquire` load.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[must_use]
    #[inline]
    pub fn test_bit(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "AtomicBitField index out of bounds: index={} len={}",
            index,
            self.len
        );
        let mask = 1u64 << (index % WORD_BITS);
        self.words[index / WORD_BITS].load(Ordering::Acquire) & mask != 0
    }

    /// Set one bit with a compare-and-swap loop.
    ///
    /// Returns `true` if this call flipped the bit, `false` if it was already set.
    /// The loop retries only when another writer changed the word between load and
    /// swap, and stops without writing once the bit is seen set.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn set_bit(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "AtomicBitField index out of bounds: index={} len={}",
            index,
            self.len
        );
        let word = &self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);

        let mut current = word.load(Ordering::Acquire);
        loop {
            if current & mask != 0 {
                return false;
            }
            match word.compare_exchange_weak(
                current,
                current | mask,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Zero every word.
    ///
    /// Each word is stored atomically, so a concurrent reader sees every bit as
    /// either its old or its new value.
    pub fn clear_all(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Release);
        }
    }

    /// Zero the bits in `range`, leaving bits of neighbouring ranges in shared
    /// words untouched.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > len`.
    pub fn clear_range(&self, range: Range<usize>) {
        assert!(range.end <= self.len, "range {:?} exceeds {} bits", range, self.len);
        for w in words_of(&range) {
            let mask = range_mask(w, &range);
            if mask == u64::MAX {
                self.words[w].store(0, Ordering::Release);
            } else {
                self.words[w].fetch_and(!mask, Ordering::AcqRel);
            }
        }
    }

    /// OR raw words into the whole field, ignoring anything beyond `len`.
    ///
    /// # Panics
    ///
    /// Panics if `words.len()` differs from this field's word count.
    pub fn merge_words(&self, words: &[u64]) {
        self.merge_range(words, 0..self.len);
    }

    /// OR the bits of `words` that fall inside `range` into this field.
    ///
    /// `words` is a full-length word vector; only its `range` portion is read.
    ///
    /// # Panics
    ///
    /// Panics if `words.len()` differs from this field's word count or
    /// `range.end > len`.
    pub fn merge_range(&self, words: &[u64], range: Range<usize>) {
        assert_eq!(
            self.words.len(),
            words.len(),
            "AtomicBitField word count mismatch in merge"
        );
        assert!(range.end <= self.len, "range {:?} exceeds {} bits", range, self.len);
        for w in words_of(&range) {
            let incoming = words[w] & range_mask(w, &range);
            if incoming != 0 {
                self.words[w].fetch_or(incoming, Ordering::AcqRel);
            }
        }
    }

    /// OR the bits of `range` into `out`, a full-length word vector.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from this field's word count or
    /// `range.end > len`.
    pub fn load_range_into(&self, out: &mut [u64], range: Range<usize>) {
        assert_eq!(self.words.len(), out.len(), "output word count mismatch");
        assert!(range.end <= self.len, "range {:?} exceeds {} bits", range, self.len);
        for w in words_of(&range) {
            out[w] |= self.words[w].load(Ordering::Acquire) & range_mask(w, &range);
        }
    }

    /// Per-word atomic snapshot of the backing words.
    #[must_use]
    pub fn to_words(&self) -> Vec<u64> {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire))
            .collect()
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Number of backing words.
    #[must_use]
    #[inline]
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Heap plus inline bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.words.len() * std::mem::size_of::<AtomicU64>() + std::mem::size_of::<Self>()
    }
}
