use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::document::{ExtensionPolicy, PolicyDocument, POLICY_FILE_NAME};
use super::locator::{PolicyLocator, SystemPolicyLocator};
use super::vendor::{Platform, Vendor};
use crate::identity::ExtensionId;
use crate::manifest::manifest_url;

/// Mode for policy directories we create: writable by the owner only
#[cfg(unix)]
const POLICY_DIR_MODE: u32 = 0o755;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to create policy directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write policy file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read policy file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("policy file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode policy: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of clearing a policy directory before writing to it
///
/// Cleanup is best effort: entries that could not be removed are reported
/// here and logged, but never abort the write that follows.
#[derive(Debug, Default)]
pub struct CleanupOutcome {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, std::io::Error)>,
}

impl CleanupOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes (and reverts) force-install policy for an extension
#[derive(Debug)]
pub struct PolicyInjector {
    locator: Box<dyn PolicyLocator>,
    platform: Platform,
}

impl Default for PolicyInjector {
    fn default() -> Self {
        Self::new(SystemPolicyLocator)
    }
}

impl PolicyInjector {
    pub fn new(locator: impl PolicyLocator + 'static) -> Self {
        Self {
            locator: Box::new(locator),
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Policy directories for `vendors` on this platform, without duplicates.
    /// Unsupported vendors contribute nothing.
    pub fn resolve(&self, vendors: &[Vendor]) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for &vendor in vendors {
            match self.locator.policy_dirs(vendor, self.platform) {
                Some(found) => {
                    for dir in found {
                        if !dirs.contains(&dir) {
                            dirs.push(dir);
                        }
                    }
                }
                None => tracing::debug!(
                    %vendor,
                    platform = %self.platform,
                    "no managed policy location, skipping"
                ),
            }
        }
        dirs
    }

    /// Force-install `id` from `<manifest_base_url><id>.xml` for every vendor.
    /// Returns the policy files written.
    pub async fn inject(
        &self,
        id: &ExtensionId,
        manifest_base_url: &str,
        vendors: &[Vendor],
    ) -> Result<Vec<PathBuf>, PolicyError> {
        let policy = ExtensionPolicy::force_installed(manifest_url(manifest_base_url, id.as_str()));
        let contents = serde_json::to_string_pretty(&PolicyDocument::single(id, &policy)?)?;

        let mut written = Vec::new();
        for dir in self.resolve(vendors) {
            ensure_policy_dir(&dir).await?;

            let outcome = clear_policy_dir(&dir).await;
            for (path, error) in &outcome.failures {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "could not remove existing policy entry"
                );
            }

            let path = dir.join(POLICY_FILE_NAME);
            tokio::fs::write(&path, &contents)
                .await
                .map_err(|source| PolicyError::WriteFailed {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), "wrote extension policy");
            written.push(path);
        }

        Ok(written)
    }

    /// Remove the `ExtensionSettings` entry for `id` from every vendor's
    /// policy file, deleting files that end up empty. Returns the files
    /// that were changed or deleted.
    pub async fn remove(
        &self,
        id: &ExtensionId,
        vendors: &[Vendor],
    ) -> Result<Vec<PathBuf>, PolicyError> {
        let mut touched = Vec::new();
        for dir in self.resolve(vendors) {
            let path = dir.join(POLICY_FILE_NAME);
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(PolicyError::ReadFailed { path, source }),
            };

            let mut document: PolicyDocument = serde_json::from_str(&raw)
                .map_err(|source| PolicyError::Malformed {
                    path: path.clone(),
                    source,
                })?;
            if !document.remove(id) {
                continue;
            }

            let result = if document.is_empty() {
                tokio::fs::remove_file(&path).await
            } else {
                tokio::fs::write(&path, serde_json::to_string_pretty(&document)?).await
            };
            result.map_err(|source| PolicyError::WriteFailed {
                path: path.clone(),
                source,
            })?;

            tracing::debug!(path = %path.display(), "removed extension policy");
            touched.push(path);
        }
        Ok(touched)
    }
}

async fn ensure_policy_dir(dir: &Path) -> Result<(), PolicyError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(POLICY_DIR_MODE);

    builder
        .create(dir)
        .await
        .map_err(|source| PolicyError::CreateDirFailed {
            path: dir.to_path_buf(),
            source,
        })
}

/// Remove everything already in `dir` so no older document can conflict
/// with the one we are about to write.
pub async fn clear_policy_dir(dir: &Path) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            outcome.failures.push((dir.to_path_buf(), e));
            return outcome;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                outcome.failures.push((dir.to_path_buf(), e));
                break;
            }
        };

        let path = entry.path();
        let result = match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => tokio::fs::remove_dir_all(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => outcome.removed.push(path),
            Err(e) => outcome.failures.push((path, e)),
        }
    }

    outcome
}
