//! Storage roots and their on-disk layout.

use std::path::{Path, PathBuf};

use darkroom_shared::config::StorageConfig;

use super::error::StorageError;

/// The three storage namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageRoot {
    /// Uploaded originals.
    Originals,
    /// Processed derivatives.
    Cache,
    /// Thumbnail derivatives.
    Thumbnails,
}

impl StorageRoot {
    /// Returns the lowercase root name used in logs and health output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Originals => "originals",
            Self::Cache => "cache",
            Self::Thumbnails => "thumbnails",
        }
    }
}

/// Absolute, canonical base directories for the three storage roots.
///
/// Built once at startup and shared by every component. Every path the
/// service resolves must be a descendant of one of these directories.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    originals: PathBuf,
    cache: PathBuf,
    thumbnails: PathBuf,
}

impl StorageLayout {
    /// Creates the root directories if missing and canonicalizes them.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or canonicalized.
    pub fn init(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self {
            originals: prepare_root(&config.originals_dir)?,
            cache: prepare_root(&config.cache_dir)?,
            thumbnails: prepare_root(&config.thumbnails_dir)?,
        })
    }

    /// Returns the canonical base directory for a root.
    #[must_use]
    pub fn root(&self, root: StorageRoot) -> &Path {
        match root {
            StorageRoot::Originals => &self.originals,
            StorageRoot::Cache => &self.cache,
            StorageRoot::Thumbnails => &self.thumbnails,
        }
    }
}

fn prepare_root(dir: &Path) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(dir)?;
    Ok(std::fs::canonicalize(dir)?)
}
