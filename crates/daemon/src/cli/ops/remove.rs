use clap::Args;

use common::identity::{ExtensionId, ExtensionIdError};
use common::policy::Vendor;
use common::store::ArtifactStore;
use depot_daemon::pipeline::{withdraw, DeployError};
use depot_daemon::state::StateError;

use super::vendors_or_all;

#[derive(Args, Debug, Clone)]
pub struct Remove {
    /// Extension identifier to withdraw
    #[arg(long)]
    pub id: String,

    /// Browser vendor to withdraw from (repeatable, default: all)
    #[arg(long = "vendor")]
    pub vendors: Vec<Vendor>,

    /// Also delete the stored artifact so it is no longer served
    #[arg(long)]
    pub purge: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoveError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
    #[error("invalid extension id: {0}")]
    InvalidId(#[from] ExtensionIdError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Remove {
    type Error = RemoveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let id: ExtensionId = self.id.parse()?;
        let state = ctx.state()?;
        let store = ArtifactStore::new(&state.artifacts_path);

        let removal = withdraw(
            &state.config.policy_injector()?,
            &store,
            &id,
            &vendors_or_all(&self.vendors),
            self.purge,
        )
        .await?;

        let mut lines = vec![format!("Removed {}", id)];
        if removal.policy_paths.is_empty() {
            lines.push("  no policy entries found".to_string());
        }
        for path in &removal.policy_paths {
            lines.push(format!("  policy:   {}", path.display()));
        }
        if removal.artifact_removed {
            lines.push(format!("  artifact: {}", store.path_for(&id).display()));
        }
        Ok(lines.join("\n"))
    }
}
