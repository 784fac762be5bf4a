use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use super::keys::{KeyError, SigningKey};
use crate::permissions::FilePermissions;

const KEY_FILE_SUFFIX: &str = "_key.pem";

/// Directory of generated signing keys
///
/// Every call to [`KeyStore::generate`] produces a fresh key in its own
/// `<epoch-ms>_key.pem` file. Keys are never reused: the extension
/// identifier is a function of the key, so reusing one would collide two
/// deployments on the same identifier.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
    permissions: FilePermissions,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>, permissions: FilePermissions) -> Self {
        Self {
            dir: dir.into(),
            permissions,
        }
    }

    /// Generate a new key and persist it, returning the path of the PEM file
    pub async fn generate(&self) -> Result<PathBuf, KeyError> {
        let key = tokio::task::spawn_blocking(SigningKey::generate)
            .await
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))??;
        self.persist(&key).await
    }

    /// Persist an existing key under a fresh timestamped name
    pub async fn persist(&self, key: &SigningKey) -> Result<PathBuf, KeyError> {
        let pem = key.to_pem()?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| KeyError::PersistFailed {
                path: self.dir.clone(),
                source,
            })?;

        // create_new makes the name claim atomic; on a clash within the same
        // millisecond we just move to the next one.
        let mut stamp = chrono::Utc::now().timestamp_millis();
        let (path, mut file) = loop {
            let path = self.dir.join(format!("{}{}", stamp, KEY_FILE_SUFFIX));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(source) => return Err(KeyError::PersistFailed { path, source }),
            }
        };

        let persist_failed = |source| KeyError::PersistFailed {
            path: path.clone(),
            source,
        };
        file.write_all(pem.as_bytes())
            .await
            .map_err(persist_failed)?;
        file.sync_all().await.map_err(persist_failed)?;
        drop(file);

        self.permissions
            .apply(&path)
            .await
            .map_err(persist_failed)?;

        tracing::debug!(path = %path.display(), "persisted signing key");
        Ok(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FIXTURE_PKCS8: &str = include_str!("../../tests/fixtures/extension_key.pem");

    #[tokio::test]
    async fn test_persist_names_are_unique() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("keys"), FilePermissions::Strict);
        let key = SigningKey::from_pem(FIXTURE_PKCS8).unwrap();

        let first = store.persist(&key).await.unwrap();
        let second = store.persist(&key).await.unwrap();
        assert_ne!(first, second);

        for path in [&first, &second] {
            let name = path.file_name().unwrap().to_str().unwrap();
            let stamp = name.strip_suffix(KEY_FILE_SUFFIX).unwrap();
            assert!(stamp.parse::<i64>().is_ok(), "unexpected name {}", name);

            let loaded = SigningKey::load(path).unwrap();
            assert_eq!(
                loaded.extension_id().unwrap(),
                key.extension_id().unwrap()
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relaxed_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let store = KeyStore::new(dir.path(), FilePermissions::Relaxed);
        let key = SigningKey::from_pem(FIXTURE_PKCS8).unwrap();

        let path = store.persist(&key).await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }
}
