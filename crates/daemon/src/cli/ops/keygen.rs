use clap::Args;

use common::crypto::{KeyError, KeyStore};
use common::identity::ExtensionId;
use common::permissions::FilePermissions;
use depot_daemon::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Keygen {
    /// Keep the key private to the current user, whatever the config says
    #[arg(long)]
    pub strict_permissions: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let permissions = if self.strict_permissions {
            FilePermissions::Strict
        } else {
            state.config.file_permissions()
        };

        let path = KeyStore::new(&state.keys_path, permissions).generate().await?;
        let id = ExtensionId::read(&path).await?;

        Ok(format!("{}\n{}", path.display(), id))
    }
}
