//! Filesystem-backed store.
//!
//! Each filter lives in `<dir>/<id>.bloom`. The file holds a versioned record
//! (format version, hasher name, id, `num_bits`, `num_hashes`, seeds, words) encoded
//! with bincode or, for inspection, JSON. Each write goes to its own uniquely named
//! temporary file in the store directory, which is then renamed over the target. A
//! reader never sees a half-written artifact, and concurrent stores of the same id
//! each replace the file whole.
//!
//! # Examples
//!
//! ```
//! use bloomsync::persist::{ArtifactFormat, FileStore};
//! use bloomsync::sync::GlobalLockBloomFilter;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = FileStore::with_format(dir.path(), ArtifactFormat::Json);
//!
//! let filter = GlobalLockBloomFilter::new("emails", 2048, 3).unwrap();
//! filter.add("a@example.com");
//! let handle = filter.save(&store).unwrap();
//! assert!(handle.path().unwrap().ends_with("emails.bloom"));
//!
//! let restored = GlobalLockBloomFilter::load("emails", &store).unwrap();
//! assert!(restored.check("a@example.com"));
//! ```

use super::record::ArtifactRecord;
use super::{ArtifactHandle, PersistenceCodec};
use crate::core::filter::FilterState;
use crate::error::{BloomSyncError, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File extension of stored artifacts.
pub const ARTIFACT_EXTENSION: &str = "bloom";

/// Encoding of artifact files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFormat {
    /// Compact bincode encoding.
    #[default]
    Binary,
    /// Human-readable JSON.
    Json,
}

impl ArtifactFormat {
    fn encode(self, state: &FilterState) -> Result<Vec<u8>> {
        let record = ArtifactRecord::from_state(state);
        match self {
            Self::Binary => bincode::serialize(&record)
                .map_err(|e| BloomSyncError::serialization_error(e.to_string())),
            Self::Json => serde_json::to_vec_pretty(&record)
                .map_err(|e| BloomSyncError::serialization_error(e.to_string())),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<FilterState> {
        let record: ArtifactRecord = match self {
            Self::Binary => bincode::deserialize(bytes)
                .map_err(|e| BloomSyncError::serialization_error(e.to_string()))?,
            Self::Json => serde_json::from_slice(bytes)
                .map_err(|e| BloomSyncError::serialization_error(e.to_string()))?,
        };
        record.into_state()
    }
}

/// Stores artifacts as files in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    dir: PathBuf,
    format: ArtifactFormat,
}

impl FileStore {
    /// Binary store rooted at `dir`. The directory is created on first store.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_format(dir, ArtifactFormat::default())
    }

    /// Store rooted at `dir` with an explicit encoding.
    #[must_use]
    pub fn with_format(dir: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encoding in use.
    #[must_use]
    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    /// Path of the artifact for `id`.
    ///
    /// # Errors
    ///
    /// [`BloomSyncError::InvalidParameters`] if `id` is empty or could name a file
    /// outside the store directory.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
            return Err(BloomSyncError::invalid_parameters(format!(
                "filter id '{}' cannot be used as an artifact name",
                id
            )));
        }
        Ok(self.dir.join(format!("{}.{}", id, ARTIFACT_EXTENSION)))
    }
}

impl PersistenceCodec for FileStore {
    fn store(&self, state: &FilterState) -> Result<ArtifactHandle> {
        let id = state.params().id();
        let path = self.path_for(id)?;
        let bytes = self.format.encode(state)?;

        fs::create_dir_all(&self.dir)?;
        // Dropped (and removed) on any error before persist
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| BloomSyncError::from(e.error))?;

        tracing::debug!(id, path = %path.display(), bytes = bytes.len(), "filter stored");
        Ok(ArtifactHandle::at_path(id, path))
    }

    fn load(&self, id: &str) -> Result<FilterState> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BloomSyncError::artifact_not_found(id));
            }
            Err(e) => return Err(e.into()),
        };

        let state = self.format.decode(&bytes)?;
        if state.params().id() != id {
            return Err(BloomSyncError::invalid_state(format!(
                "artifact '{}' holds filter '{}'",
                id,
                state.params().id()
            )));
        }

        tracing::debug!(id, path = %path.display(), "filter loaded");
        Ok(state)
    }
}
