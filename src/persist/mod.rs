//! Durable storage of filter state.
//!
//! A store maps a filter id to one artifact holding the filter's parameters and raw
//! words. Loading an artifact reproduces the stored [`FilterState`] exactly, and any
//! variant can be rebuilt from it with `from_state`.
//!
//! # Module Structure
//!
//! ```text
//! persist/
//! ├── file.rs    - FileStore: <dir>/<id>.bloom, bincode or JSON (feature = "serde")
//! ├── memory.rs  - MemoryStore: in-process map
//! └── mod.rs     - PersistenceCodec trait, ArtifactHandle, artifact record
//! ```
//!
//! # Errors
//!
//! | Condition                     | Error                                       |
//! |-------------------------------|---------------------------------------------|
//! | nothing stored under the id   | [`BloomSyncError::ArtifactNotFound`]        |
//! | filesystem failure            | [`BloomSyncError::Io`]                      |
//! | corrupt or foreign artifact   | `Serialization` / `InvalidState`            |
//!
//! # Examples
//!
//! ```
//! use bloomsync::persist::{MemoryStore, PersistenceCodec};
//! use bloomsync::sync::LockFreeBloomFilter;
//!
//! let store = MemoryStore::new();
//! let filter = LockFreeBloomFilter::new("sessions", 4096, 4).unwrap();
//! filter.add("session-1");
//! filter.save(&store).unwrap();
//!
//! let restored = LockFreeBloomFilter::load("sessions", &store).unwrap();
//! assert!(restored.check("session-1"));
//! assert!(store.load("missing").unwrap_err().is_not_found());
//! ```

use crate::core::filter::FilterState;
use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
pub mod file;
pub mod memory;

#[cfg(feature = "serde")]
pub use file::{ArtifactFormat, FileStore};
pub use memory::MemoryStore;

/// Identifies a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactHandle {
    id: String,
    location: Option<PathBuf>,
}

impl ArtifactHandle {
    /// Handle for an artifact addressed only by id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
        }
    }

    /// Handle for an artifact stored at a filesystem path.
    #[must_use]
    pub fn at_path(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            location: Some(path.into()),
        }
    }

    /// Filter id the artifact was stored under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Filesystem location, for stores that have one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(path) => write!(f, "{} ({})", self.id, path.display()),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Stores and loads filter state by id.
///
/// Implementations must round-trip exactly: `load(id)` after `store(s)` with
/// `s.params().id() == id` returns a state equal to `s`. A later `store` under
/// the same id replaces the earlier artifact.
pub trait PersistenceCodec: Send + Sync {
    /// Persist `state` under `state.params().id()`.
    ///
    /// # Errors
    ///
    /// I/O or encoding failures, propagated unchanged in kind.
    fn store(&self, state: &FilterState) -> Result<ArtifactHandle>;

    /// Load the state stored under `id`.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::ArtifactNotFound`] if nothing is stored under `id`;
    /// I/O or decoding failures otherwise.
    ///
    /// [`BloomSyncError::ArtifactNotFound`]: crate::BloomSyncError::ArtifactNotFound
    fn load(&self, id: &str) -> Result<FilterState>;
}

impl<P: PersistenceCodec + ?Sized> PersistenceCodec for &P {
    fn store(&self, state: &FilterState) -> Result<ArtifactHandle> {
        (**self).store(state)
    }

    fn load(&self, id: &str) -> Result<FilterState> {
        (**self).load(id)
    }
}

impl<P: PersistenceCodec + ?Sized> PersistenceCodec for std::sync::Arc<P> {
    fn store(&self, state: &FilterState) -> Result<ArtifactHandle> {
        (**self).store(state)
    }

    fn load(&self, id: &str) -> Result<FilterState> {
        (**self).load(id)
    }
}

#[cfg(feature = "serde")]
pub(crate) mod record {
    //! Versioned on-disk form of a [`FilterState`].

    use crate::core::filter::FilterState;
    use crate::core::params::{FilterParams, Seeds};
    use crate::error::{BloomSyncError, Result};
    use crate::hash::{BloomHasher, DefaultHasher};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Artifact format version.
    pub(crate) const FORMAT_VERSION: u16 = 1;

    #[derive(Serialize, Deserialize)]
    pub(crate) struct ArtifactRecord {
        version: u16,
        /// Hash function the words were derived with; a different hasher maps values
        /// to different bits.
        hasher: String,
        id: String,
        num_bits: usize,
        num_hashes: usize,
        seeds: Seeds,
        words: Vec<u64>,
    }

    impl ArtifactRecord {
        pub(crate) fn from_state(state: &FilterState) -> Self {
            let params = state.params();
            Self {
                version: FORMAT_VERSION,
                hasher: DefaultHasher::default().name().to_string(),
                id: params.id().to_string(),
                num_bits: params.num_bits(),
                num_hashes: params.num_hashes(),
                seeds: params.seeds(),
                words: state.words().to_vec(),
            }
        }

        pub(crate) fn into_state(self) -> Result<FilterState> {
            if self.version != FORMAT_VERSION {
                return Err(BloomSyncError::serialization_error(format!(
                    "unsupported artifact version: expected {}, got {}",
                    FORMAT_VERSION, self.version
                )));
            }
            let expected = DefaultHasher::default().name();
            if self.hasher != expected {
                return Err(BloomSyncError::serialization_error(format!(
                    "artifact was written with hasher '{}', this build uses '{}'",
                    self.hasher, expected
                )));
            }
            let params = FilterParams::new(self.id, self.num_bits, self.num_hashes, self.seeds)?;
            FilterState::new(params, self.words)
        }
    }

    impl Serialize for FilterState {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            ArtifactRecord::from_state(self).serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for FilterState {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            ArtifactRecord::deserialize(deserializer)?
                .into_state()
                .map_err(serde::de::Error::custom)
        }
    }
}
