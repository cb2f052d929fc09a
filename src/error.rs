//! Error types for bloomsync operations.
//!
//! Errors fall into a small taxonomy:
//!
//! - **Construction errors** ([`BloomSyncError::InvalidParameters`],
//!   [`BloomSyncError::InvalidShardCount`]) indicate a programming mistake and are
//!   reported eagerly by constructors.
//! - **State errors** ([`BloomSyncError::InvalidState`]) reject raw word vectors that
//!   do not match their parameters.
//! - **Persistence errors** ([`BloomSyncError::ArtifactNotFound`],
//!   [`BloomSyncError::Io`], [`BloomSyncError::Serialization`]) are propagated from
//!   the storage layer unchanged in kind.
//!
//! A parameter mismatch during `union` is *not* an error: it is reported through the
//! boolean return value. [`BloomSyncError::IncompatibleFilters`] exists only for the
//! `try_union` helpers that want `?` ergonomics.
//!
//! # Error Propagation
//!
//! ```
//! use bloomsync::{Result, BloomSyncError};
//! use bloomsync::sync::LockFreeBloomFilter;
//!
//! fn build(bits: usize) -> Result<LockFreeBloomFilter> {
//!     let filter = LockFreeBloomFilter::new("sessions", bits, 4)?;
//!     Ok(filter)
//! }
//!
//! assert!(build(1024).is_ok());
//! assert!(matches!(build(0), Err(BloomSyncError::InvalidParameters { .. })));
//! ```

#![allow(clippy::module_name_repetitions)]

use std::fmt;

/// Result type alias for bloomsync operations.
pub type Result<T> = std::result::Result<T, BloomSyncError>;

/// Errors that can occur while building, merging or persisting filters.
///
/// `Clone` + `PartialEq` keep the error easy to assert on in tests, which is why
/// I/O failures carry a rendered message rather than the `std::io::Error` itself.
#[derive(Debug, Clone, PartialEq)]
pub enum BloomSyncError {
    /// Invalid filter parameters provided during construction.
    InvalidParameters {
        /// Human-readable description of what's invalid.
        message: String,
    },

    /// A sharded filter was requested with zero shards.
    InvalidShardCount {
        /// The shard count that was requested.
        requested: usize,
    },

    /// Two filters are not union-compatible.
    IncompatibleFilters {
        /// Description of the incompatibility.
        reason: String,
    },

    /// A raw filter state does not agree with its own parameters.
    InvalidState {
        /// Description of the inconsistency.
        message: String,
    },

    /// No persisted artifact exists for the requested filter id.
    ArtifactNotFound {
        /// The filter id that was looked up.
        id: String,
    },

    /// Reading or writing a persisted artifact failed.
    Io {
        /// Rendered I/O error.
        message: String,
    },

    /// Encoding or decoding a persisted artifact failed.
    #[cfg(feature = "serde")]
    Serialization {
        /// Description of what failed.
        message: String,
    },

    /// A structured value could not be encoded to canonical bytes.
    Encoding {
        /// Description of what failed.
        message: String,
    },
}

impl fmt::Display for BloomSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters { message } => {
                write!(f, "Invalid Bloom filter parameters: {}.", message)
            }
            Self::InvalidShardCount { requested } => {
                write!(
                    f,
                    "Invalid shard count: {}. A sharded filter needs at least one shard.",
                    requested
                )
            }
            Self::IncompatibleFilters { reason } => {
                write!(f, "Cannot merge incompatible filters: {}.", reason)
            }
            Self::InvalidState { message } => {
                write!(f, "Invalid filter state: {}.", message)
            }
            Self::ArtifactNotFound { id } => {
                write!(f, "No persisted filter found for id '{}'.", id)
            }
            Self::Io { message } => write!(f, "I/O error: {}.", message),
            #[cfg(feature = "serde")]
            Self::Serialization { message } => {
                write!(f, "Serialization error: {}.", message)
            }
            Self::Encoding { message } => {
                write!(f, "Value encoding error: {}.", message)
            }
        }
    }
}

impl std::error::Error for BloomSyncError {}

impl From<std::io::Error> for BloomSyncError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl BloomSyncError {
    /// Create an `InvalidParameters` error with a formatted message.
    ///
    /// # Examples
    /// ```
    /// use bloomsync::BloomSyncError;
    ///
    /// let err = BloomSyncError::invalid_parameters(format!("num_bits={} is too small", 0));
    /// assert!(err.to_string().contains("num_bits=0"));
    /// ```
    #[must_use]
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create an `InvalidShardCount` error.
    #[must_use]
    pub fn invalid_shard_count(requested: usize) -> Self {
        Self::InvalidShardCount { requested }
    }

    /// Create an `IncompatibleFilters` error.
    #[must_use]
    pub fn incompatible_filters(reason: impl Into<String>) -> Self {
        Self::IncompatibleFilters {
            reason: reason.into(),
        }
    }

    /// Create an `InvalidState` error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an `ArtifactNotFound` error.
    #[must_use]
    pub fn artifact_not_found(id: impl Into<String>) -> Self {
        Self::ArtifactNotFound { id: id.into() }
    }

    /// Create an `Io` error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a `Serialization` error.
    #[cfg(feature = "serde")]
    #[must_use]
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Whether this error means the artifact simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ArtifactNotFound { .. })
    }
}
