//! Storage port for cached derivative files.
//!
//! The filesystem is the sole source of truth for which derivatives exist;
//! there is no in-memory index. This trait is the seam where an index or
//! metadata store could be substituted without touching orchestration.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::error::StorageError;

/// Persistence port for derivative files.
pub trait CacheStore: Send + Sync {
    /// Whether a derivative already exists at `path`.
    fn exists(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<bool, StorageError>> + Send;

    /// Read a derivative's bytes.
    fn read(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Persist a derivative, creating parent directories as needed.
    ///
    /// Overwrites any existing file at `path`; concurrent writers for the
    /// same key race and the last commit wins.
    fn commit(
        &self,
        path: &Path,
        bytes: &[u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// Filesystem-backed cache store.
///
/// Commits write to a temporary sibling and atomically rename into place, so
/// a concurrent reader never observes a partially written derivative.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCacheStore;

impl FsCacheStore {
    /// Create a filesystem cache store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for FsCacheStore {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(path.display().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn commit(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temp_sibling(path);
        let result = write_and_rename(&tmp, path, bytes).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result
    }
}

async fn write_and_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp, path).await?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "derivative".to_string(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp.{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_creates_parents_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCacheStore::new();
        let path = dir.path().join("section/nested/300x300_80_photo.webp");

        assert!(!store.exists(&path).await.expect("exists"));
        store.commit(&path, b"derivative bytes").await.expect("commit");
        assert!(store.exists(&path).await.expect("exists"));
        assert_eq!(
            store.read(&path).await.expect("read"),
            b"derivative bytes".to_vec()
        );
    }

    #[tokio::test]
    async fn test_commit_overwrites_existing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCacheStore::new();
        let path = dir.path().join("photo.webp");

        store.commit(&path, b"first").await.expect("commit");
        store.commit(&path, b"second").await.expect("commit");
        assert_eq!(store.read(&path).await.expect("read"), b"second".to_vec());
    }

    #[tokio::test]
    async fn test_commit_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCacheStore::new();
        let path = dir.path().join("photo.webp");

        store.commit(&path, b"bytes").await.expect("commit");

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["photo.webp".to_string()]);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCacheStore::new();

        let result = store.read(&dir.path().join("absent.webp")).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }
}
