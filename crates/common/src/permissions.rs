use std::path::Path;

use serde::{Deserialize, Serialize};

/// How generated files (keys, packed artifacts) are exposed on disk
///
/// `Relaxed` makes them world read/write on POSIX so a packaging
/// subprocess or serving process running as another user can reach them.
/// This is only acceptable on a machine where every local user is trusted,
/// which is the provisioning context this tool runs in. `Strict` leaves the
/// permissions the process umask produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePermissions {
    #[default]
    Relaxed,
    Strict,
}

impl FilePermissions {
    pub fn from_relaxed(relaxed: bool) -> Self {
        if relaxed {
            Self::Relaxed
        } else {
            Self::Strict
        }
    }

    pub async fn apply(self, path: &Path) -> std::io::Result<()> {
        match self {
            Self::Strict => Ok(()),
            Self::Relaxed => relax(path).await,
        }
    }
}

#[cfg(unix)]
async fn relax(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777)).await
}

// NOTE: ACL-based systems get no equivalent; the defaults already let
//  local administrators read the files.
#[cfg(not(unix))]
async fn relax(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
