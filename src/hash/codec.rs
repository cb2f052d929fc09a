//! Canonical byte encoding of values.
//!
//! Every value handed to a filter is first turned into a byte sequence, and only
//! those bytes are hashed. The encoding is a closed set of rules:
//!
//! | Category                      | Encoding                                   |
//! |-------------------------------|--------------------------------------------|
//! | `str`, `String`               | UTF-8 bytes                                |
//! | `[u8]`, `Vec<u8>`, `[u8; N]`  | the bytes themselves                       |
//! | `i8`..`i64`, `isize`          | widened to `i64`, 8 bytes big-endian       |
//! | `u8`..`u64`, `usize`          | widened to `u64`, 8 bytes big-endian       |
//! | `f32` / `f64`                 | IEEE-754 bits, 4 / 8 bytes big-endian      |
//! | `char`                        | UTF-8 bytes                                |
//! | `bool`                        | `"true"` / `"false"`                       |
//! | `Option<T>`                   | `None` is `"null"`, `Some(v)` encodes `v`  |
//! | [`Stringified<T>`]            | `T::to_string()`                           |
//! | [`Structured`]                | JSON via `serde_json`                      |
//!
//! Widening integers means `5u8` and `5u64` are the same filter entry, as are `-1i8`
//! and `-1i64`. Signed and unsigned values of the same magnitude share bytes only
//! when non-negative.
//!
//! # Examples
//!
//! ```
//! use bloomsync::hash::CanonicalBytes;
//!
//! assert_eq!(&*"abc".canonical_bytes(), b"abc");
//! assert_eq!(&*7u16.canonical_bytes(), &[0, 0, 0, 0, 0, 0, 0, 7]);
//! assert_eq!(7u16.canonical_bytes(), 7u64.canonical_bytes());
//! assert_eq!(&*true.canonical_bytes(), b"true");
//! ```

use std::borrow::Cow;
use std::fmt;

/// Deterministic value-to-bytes encoding.
///
/// Equal values must produce equal bytes in every call and every process. Types
/// whose natural representation depends on iteration order of unordered
/// containers, addresses or random state must not implement this trait.
pub trait CanonicalBytes {
    /// The canonical bytes of `self`.
    fn canonical_bytes(&self) -> Cow<'_, [u8]>;
}

impl<T: CanonicalBytes + ?Sized> CanonicalBytes for &T {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        (**self).canonical_bytes()
    }
}

impl CanonicalBytes for str {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl CanonicalBytes for String {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl CanonicalBytes for [u8] {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl CanonicalBytes for Vec<u8> {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl<const N: usize> CanonicalBytes for [u8; N] {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

macro_rules! impl_signed {
    ($($t:ty),*) => {
        $(
            impl CanonicalBytes for $t {
                #[inline]
                fn canonical_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Owned((*self as i64).to_be_bytes().to_vec())
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {
        $(
            impl CanonicalBytes for $t {
                #[inline]
                fn canonical_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Owned((*self as u64).to_be_bytes().to_vec())
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

impl CanonicalBytes for f32 {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.to_be_bytes().to_vec())
    }
}

impl CanonicalBytes for f64 {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.to_be_bytes().to_vec())
    }
}

impl CanonicalBytes for char {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        let mut buf = [0u8; 4];
        Cow::Owned(self.encode_utf8(&mut buf).as_bytes().to_vec())
    }
}

impl CanonicalBytes for bool {
    #[inline]
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        let text: &'static [u8] = if *self { b"true" } else { b"false" };
        Cow::Borrowed(text)
    }
}

impl<T: CanonicalBytes> CanonicalBytes for Option<T> {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Some(value) => value.canonical_bytes(),
            None => Cow::Borrowed(b"null"),
        }
    }
}

/// Encodes a user-defined type through its [`Display`](fmt::Display) output.
///
/// The `Display` impl must be deterministic for this to be sound.
///
/// ```
/// use bloomsync::hash::{CanonicalBytes, Stringified};
/// use std::net::Ipv4Addr;
///
/// let addr = Stringified(Ipv4Addr::new(10, 0, 0, 1));
/// assert_eq!(&*addr.canonical_bytes(), b"10.0.0.1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stringified<T>(pub T);

impl<T: fmt::Display> CanonicalBytes for Stringified<T> {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.0.to_string().into_bytes())
    }
}

#[cfg(feature = "serde")]
pub use structured::Structured;

#[cfg(feature = "serde")]
mod structured {
    use super::CanonicalBytes;
    use crate::error::{BloomSyncError, Result};
    use serde::Serialize;
    use std::borrow::Cow;

    /// A structured value encoded eagerly as JSON.
    ///
    /// Struct fields serialize in declaration order, which keeps the encoding stable.
    /// Maps must have a deterministic iteration order: use `BTreeMap`, never
    /// `HashMap`.
    ///
    /// ```
    /// use bloomsync::hash::{CanonicalBytes, Structured};
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Point { x: i32, y: i32 }
    ///
    /// let a = Structured::new(&Point { x: 1, y: 2 }).unwrap();
    /// let b = Structured::new(&Point { x: 1, y: 2 }).unwrap();
    /// assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    /// assert_eq!(a.as_bytes(), br#"{"x":1,"y":2}"#);
    /// ```
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct Structured {
        bytes: Vec<u8>,
    }

    impl Structured {
        /// Encode `value`.
        ///
        /// # Errors
        ///
        /// [`BloomSyncError::Encoding`] when the value cannot be represented as JSON,
        /// for example a map with non-string keys.
        pub fn new<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
            let bytes =
                serde_json::to_vec(value).map_err(|e| BloomSyncError::encoding(e.to_string()))?;
            Ok(Self { bytes })
        }

        /// The encoded bytes.
        #[must_use]
        pub fn as_bytes(&self) -> &[u8] {
            &self.bytes
        }
    }

    impl CanonicalBytes for Structured {
        #[inline]
        fn canonical_bytes(&self) -> Cow<'_, [u8]> {
            Cow::Borrowed(&self.bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes<V: CanonicalBytes + ?Sized>(v: &V) -> Vec<u8> {
        v.canonical_bytes().into_owned()
    }

    #[test]
    fn test_text_and_bytes_share_encoding() {
        assert_eq!(bytes("hello"), b"hello".to_vec());
        assert_eq!(bytes(&String::from("hello")), bytes("hello"));
        assert_eq!(bytes(&b"hello"[..]), bytes("hello"));
        assert_eq!(bytes(&b"hello".to_vec()), bytes("hello"));
        assert_eq!(bytes(b"hello"), bytes("hello"));
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(bytes(&5u8), bytes(&5u64));
        assert_eq!(bytes(&5usize), bytes(&5u32));
        assert_eq!(bytes(&-1i8), bytes(&-1i64));
        assert_eq!(bytes(&-1i64), vec![0xff; 8]);
        assert_eq!(bytes(&258u16), vec![0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_signed_and_unsigned_differ_when_negative() {
        assert_eq!(bytes(&7i32), bytes(&7u32));
        assert_ne!(bytes(&-7i32), bytes(&7u32));
    }

    #[test]
    fn test_floats() {
        assert_eq!(bytes(&1.5f64), 1.5f64.to_bits().to_be_bytes().to_vec());
        assert_eq!(bytes(&1.5f32).len(), 4);
        assert_ne!(bytes(&0.0f64), bytes(&-0.0f64));
    }

    #[test]
    fn test_bool_char_option() {
        assert_eq!(bytes(&true), b"true".to_vec());
        assert_eq!(bytes(&false), b"false".to_vec());
        assert_eq!(bytes(&'é'), "é".as_bytes().to_vec());
        assert_eq!(bytes(&None::<u32>), b"null".to_vec());
        assert_eq!(bytes(&Some(3u32)), bytes(&3u32));
    }

    #[test]
    fn test_references_encode_like_referent() {
        let s = "nested";
        let r = &s;
        assert_eq!(bytes(&r), bytes(s));
    }

    #[test]
    fn test_stringified() {
        struct Tag(u8);
        impl fmt::Display for Tag {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "tag-{}", self.0)
            }
        }
        assert_eq!(bytes(&Stringified(Tag(4))), b"tag-4".to_vec());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_structured_is_deterministic() {
        use std::collections::BTreeMap;

        let mut a = BTreeMap::new();
        a.insert("z", 1);
        a.insert("a", 2);
        let mut b = BTreeMap::new();
        b.insert("a", 2);
        b.insert("z", 1);

        let ea = Structured::new(&a).unwrap();
        let eb = Structured::new(&b).unwrap();
        assert_eq!(ea, eb);
        assert_eq!(ea.as_bytes(), br#"{"a":2,"z":1}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_structured_rejects_non_string_keys() {
        use crate::error::BloomSyncError;
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(
            Structured::new(&map),
            Err(BloomSyncError::Encoding { .. })
        ));
    }
}
