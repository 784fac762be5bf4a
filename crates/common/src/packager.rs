use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tokio::process::Command;

use crate::identity::ExtensionId;
use crate::permissions::FilePermissions;
use crate::store::{ArtifactStore, StoreError, ARTIFACT_EXTENSION};

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("extension directory {0} has no usable file name")]
    InvalidExtensionDir(PathBuf),
    #[error("failed to launch browser {browser}: {source}")]
    Spawn {
        browser: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("browser exited with {status} while packing: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },
    #[error("browser reported success but {0} was not produced")]
    MissingOutput(PathBuf),
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Packs unpacked extensions with a Chromium-family browser binary
///
/// The browser does the signing and zipping (`--pack-extension`); we only
/// drive it and then move its output into the [`ArtifactStore`] under the
/// extension's identifier.
#[derive(Debug, Clone)]
pub struct Packager {
    browser: PathBuf,
    store: ArtifactStore,
    permissions: FilePermissions,
}

impl Packager {
    pub fn new(
        browser: impl Into<PathBuf>,
        store: ArtifactStore,
        permissions: FilePermissions,
    ) -> Self {
        Self {
            browser: browser.into(),
            store,
            permissions,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Where the browser drops the packed file: next to the source
    /// directory, named after it (`/src/my-ext` -> `/src/my-ext.crx`)
    pub fn packed_output_path(extension_dir: &Path) -> Result<PathBuf, PackError> {
        let name = extension_dir
            .file_name()
            .ok_or_else(|| PackError::InvalidExtensionDir(extension_dir.to_path_buf()))?;

        let mut file_name = name.to_os_string();
        file_name.push(".");
        file_name.push(ARTIFACT_EXTENSION);

        let parent = extension_dir.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(file_name))
    }

    /// Pack `extension_dir` with `private_key_path` and store the result as
    /// the artifact for `id`. Returns the stored artifact path.
    pub async fn pack(
        &self,
        extension_dir: &Path,
        private_key_path: &Path,
        id: &ExtensionId,
    ) -> Result<PathBuf, PackError> {
        let output = Self::packed_output_path(extension_dir)?;

        // A leftover from an earlier run would mask a failed pack
        match tokio::fs::remove_file(&output).await {
            Ok(()) => tracing::debug!(path = %output.display(), "removed stale packed output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PackError::Io {
                    path: output,
                    source,
                })
            }
        }

        let mut pack_arg = OsString::from("--pack-extension=");
        pack_arg.push(extension_dir.as_os_str());
        let mut key_arg = OsString::from("--pack-extension-key=");
        key_arg.push(private_key_path.as_os_str());

        tracing::debug!(
            browser = %self.browser.display(),
            extension_dir = %extension_dir.display(),
            "packing extension"
        );
        let result = Command::new(&self.browser)
            .arg("--no-sandbox")
            .arg(pack_arg)
            .arg(key_arg)
            .output()
            .await
            .map_err(|source| PackError::Spawn {
                browser: self.browser.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(PackError::ExitStatus {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(PackError::MissingOutput(output));
        }

        self.permissions
            .apply(&output)
            .await
            .map_err(|source| PackError::Io {
                path: output.clone(),
                source,
            })?;

        Ok(self.store.import(&output, id).await?)
    }
}
