use std::path::{Path, PathBuf};

use url::Url;

use common::crypto::{KeyError, KeyStore};
use common::identity::ExtensionId;
use common::packager::{PackError, Packager};
use common::policy::{PolicyError, PolicyInjector, Vendor};
use common::store::{ArtifactStore, StoreError};

use crate::state::{AppState, StateError};

/// Everything a successful deployment produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub id: ExtensionId,
    pub key_path: PathBuf,
    pub artifact_path: PathBuf,
    pub policy_paths: Vec<PathBuf>,
}

/// What [`Deployer::remove`] undid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removal {
    pub policy_paths: Vec<PathBuf>,
    pub artifact_removed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(#[source] KeyError),
    #[error("failed to read generated key: {0}")]
    KeyReadFailed(#[source] KeyError),
    #[error("packaging failed: {0}")]
    PackagingFailed(#[source] PackError),
    #[error("failed to write policy: {0}")]
    PolicyWriteFailed(#[source] PolicyError),
    #[error("failed to remove artifact: {0}")]
    ArtifactRemoveFailed(#[source] StoreError),
}

/// Key generation, packing and policy injection, run in that order
///
/// Stages run strictly one after another and the first failure aborts the
/// deployment. Nothing already written is rolled back.
#[derive(Debug)]
pub struct Deployer {
    keys: KeyStore,
    packager: Packager,
    injector: PolicyInjector,
    manifest_base_url: Url,
}

impl Deployer {
    pub fn new(
        keys: KeyStore,
        packager: Packager,
        injector: PolicyInjector,
        manifest_base_url: Url,
    ) -> Self {
        Self {
            keys,
            packager,
            injector,
            manifest_base_url,
        }
    }

    /// Deployer over the depot directory layout, packing with `browser`
    pub fn from_state(
        state: &AppState,
        browser: impl Into<PathBuf>,
        manifest_base_url: Url,
    ) -> Result<Self, StateError> {
        let permissions = state.config.file_permissions();
        Ok(Self::new(
            KeyStore::new(&state.keys_path, permissions),
            Packager::new(
                browser,
                ArtifactStore::new(&state.artifacts_path),
                permissions,
            ),
            state.config.policy_injector()?,
            manifest_base_url,
        ))
    }

    pub fn store(&self) -> &ArtifactStore {
        self.packager.store()
    }

    /// Sign, pack and force-install the extension in `extension_dir`
    pub async fn deploy(
        &self,
        extension_dir: &Path,
        vendors: &[Vendor],
    ) -> Result<Deployment, DeployError> {
        let key_path = self
            .keys
            .generate()
            .await
            .map_err(DeployError::KeyGenerationFailed)?;
        tracing::info!(path = %key_path.display(), "generated signing key");

        let id = ExtensionId::read(&key_path)
            .await
            .map_err(DeployError::KeyReadFailed)?;
        tracing::info!(%id, "derived extension id");

        let artifact_path = self
            .packager
            .pack(extension_dir, &key_path, &id)
            .await
            .map_err(DeployError::PackagingFailed)?;
        tracing::info!(%id, path = %artifact_path.display(), "packed extension");

        let policy_paths = self
            .injector
            .inject(&id, self.manifest_base_url.as_str(), vendors)
            .await
            .map_err(DeployError::PolicyWriteFailed)?;
        if policy_paths.is_empty() {
            tracing::warn!(%id, ?vendors, "no supported browser on this platform, no policy written");
        } else {
            tracing::info!(%id, files = policy_paths.len(), "injected force-install policy");
        }

        Ok(Deployment {
            id,
            key_path,
            artifact_path,
            policy_paths,
        })
    }

    /// Withdraw the force-install policy for `id`, optionally deleting the
    /// stored artifact so the update server stops offering it
    pub async fn remove(
        &self,
        id: &ExtensionId,
        vendors: &[Vendor],
        purge_artifact: bool,
    ) -> Result<Removal, DeployError> {
        withdraw(&self.injector, self.store(), id, vendors, purge_artifact).await
    }
}

/// Undo a deployment of `id` without needing a browser or signing key
pub async fn withdraw(
    injector: &PolicyInjector,
    store: &ArtifactStore,
    id: &ExtensionId,
    vendors: &[Vendor],
    purge_artifact: bool,
) -> Result<Removal, DeployError> {
    let policy_paths = injector
        .remove(id, vendors)
        .await
        .map_err(DeployError::PolicyWriteFailed)?;
    tracing::info!(%id, files = policy_paths.len(), "removed force-install policy");

    let artifact_removed = if purge_artifact {
        let removed = store
            .remove(id)
            .await
            .map_err(DeployError::ArtifactRemoveFailed)?;
        tracing::info!(%id, removed, "purged artifact");
        removed
    } else {
        false
    };

    Ok(Removal {
        policy_paths,
        artifact_removed,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use common::permissions::FilePermissions;
    use common::policy::{OverrideLocator, SystemPolicyLocator};
    use tempfile::TempDir;

    use super::*;

    fn deployer(root: &TempDir, browser: &str) -> Deployer {
        let overrides = BTreeMap::from([(
            Vendor::Chrome,
            vec![root.path().join("policies/chrome")],
        )]);
        Deployer::new(
            KeyStore::new(root.path().join("keys"), FilePermissions::Strict),
            Packager::new(
                browser,
                ArtifactStore::new(root.path().join("artifacts")),
                FilePermissions::Strict,
            ),
            PolicyInjector::new(OverrideLocator::new(overrides, SystemPolicyLocator)),
            Url::parse("http://127.0.0.1:777/").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_missing_browser_aborts_before_policy() {
        let root = TempDir::new().unwrap();
        let ext = root.path().join("ext");
        std::fs::create_dir_all(&ext).unwrap();
        std::fs::write(ext.join("manifest.json"), "{}").unwrap();

        let err = deployer(&root, "/nonexistent/browser")
            .deploy(&ext, &[Vendor::Chrome])
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::PackagingFailed(PackError::Spawn { .. })));
        // The key is kept, policy never written
        assert_eq!(std::fs::read_dir(root.path().join("keys")).unwrap().count(), 1);
        assert!(!root.path().join("policies/chrome").exists());
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let root = TempDir::new().unwrap();
        let id: ExtensionId = "oogibonapbgdbnlooeegbgkeldobgmjl".parse().unwrap();

        let removal = deployer(&root, "/nonexistent/browser")
            .remove(&id, &[Vendor::Chrome], true)
            .await
            .unwrap();
        assert_eq!(removal, Removal::default());
    }
}
