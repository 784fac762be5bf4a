use clap::Args;

use depot_daemon::state::{AppConfig, AppState, StateError};

use crate::cli::args::ServerArgs;

#[derive(Args, Debug, Clone)]
pub struct Init {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Keep generated keys and artifacts private to the current user
    #[arg(long)]
    pub strict_permissions: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::default();
        self.server.apply(&mut config);
        config.relax_permissions = !self.strict_permissions;

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized depot directory at {}\n  keys:      {}\n  artifacts: {}\n  listen:    {}",
            state.depot_dir.display(),
            state.keys_path.display(),
            state.artifacts_path.display(),
            state.config.listen_addr(),
        ))
    }
}
