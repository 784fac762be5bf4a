use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::identity::ExtensionId;

/// File extension of packed artifacts
pub const ARTIFACT_EXTENSION: &str = "crx";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact store i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Packed extensions, addressed purely by [`ExtensionId`]
///
/// The original extension's name or source location plays no part in where
/// its artifact lives. An identifier maps to exactly one file, which is
/// replaced wholesale when the same identifier is packed again.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, id: &ExtensionId) -> PathBuf {
        self.root.join(format!("{}.{}", id, ARTIFACT_EXTENSION))
    }

    fn staging_path_for(&self, id: &ExtensionId) -> PathBuf {
        self.root.join(format!(".{}.{}.partial", id, ARTIFACT_EXTENSION))
    }

    /// Open the artifact for reading, `None` if nothing is stored under `id`
    pub async fn open(&self, id: &ExtensionId) -> Result<Option<tokio::fs::File>, StoreError> {
        let path = self.path_for(id);
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Move `src` into the store under `id`, replacing any previous artifact
    pub async fn import(&self, src: &Path, id: &ExtensionId) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let dest = self.path_for(id);
        if let Err(rename_err) = tokio::fs::rename(src, &dest).await {
            // rename(2) cannot cross filesystems, so stage a copy next to `dest`
            tracing::debug!(
                src = %src.display(),
                dest = %dest.display(),
                error = %rename_err,
                "rename failed, copying artifact instead"
            );
            let staging = self.staging_path_for(id);
            if let Err(e) = tokio::fs::copy(src, &staging).await {
                let _ = tokio::fs::remove_file(&staging).await;
                return Err(StoreError::io(src, e));
            }
            tokio::fs::rename(&staging, &dest)
                .await
                .map_err(|e| StoreError::io(&dest, e))?;
            tokio::fs::remove_file(src)
                .await
                .map_err(|e| StoreError::io(src, e))?;
        }

        Ok(dest)
    }

    /// Delete the artifact stored under `id`. Returns whether one existed.
    pub async fn remove(&self, id: &ExtensionId) -> Result<bool, StoreError> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_id() -> ExtensionId {
        "oogibonapbgdbnlooeegbgkeldobgmjl".parse().unwrap()
    }

    #[tokio::test]
    async fn test_import_replaces_previous_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));
        let id = test_id();

        let first = dir.path().join("first.crx");
        std::fs::write(&first, b"first").unwrap();
        let dest = store.import(&first, &id).await.unwrap();
        assert_eq!(dest, store.path_for(&id));
        assert!(!first.exists());

        let second = dir.path().join("second.crx");
        std::fs::write(&second, b"second").unwrap();
        store.import(&second, &id).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"second");
        assert!(store.open(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_and_remove_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let id = test_id();

        assert!(store.open(&id).await.unwrap().is_none());
        assert!(!store.remove(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_import_missing_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let result = store.import(&dir.path().join("nope.crx"), &test_id()).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[tokio::test]
    async fn test_failed_copy_keeps_previous_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));
        let id = test_id();

        let first = dir.path().join("first.crx");
        std::fs::write(&first, b"first").unwrap();
        let dest = store.import(&first, &id).await.unwrap();

        let missing = dir.path().join("missing.crx");
        match store.import(&missing, &id).await {
            Err(StoreError::Io { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(std::fs::read(&dest).unwrap(), b"first");
        assert!(!store.staging_path_for(&id).exists());
    }
}
