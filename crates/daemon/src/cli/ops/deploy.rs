use std::fmt;
use std::path::PathBuf;

use clap::Args;

use common::policy::Vendor;
use common::store::ArtifactStore;
use depot_daemon::http_server::{self, HttpServerError, Server};
use depot_daemon::pipeline::{DeployError, Deployer, Deployment};
use depot_daemon::process::graceful_shutdown_blocker;
use depot_daemon::state::StateError;

use super::vendors_or_all;
use crate::cli::args::ServerArgs;

#[derive(Args, Debug, Clone)]
pub struct Deploy {
    /// Unpacked extension directory (the one holding manifest.json)
    #[arg(long)]
    pub extension: PathBuf,

    /// Chromium-family browser binary used to pack the extension
    #[arg(long)]
    pub browser: PathBuf,

    /// Browser vendor to force-install into (repeatable, default: all)
    #[arg(long = "vendor")]
    pub vendors: Vec<Vendor>,

    /// Exit once the policy is written instead of serving until interrupted
    #[arg(long)]
    pub detach: bool,

    /// Keep generated keys and artifacts private to the current user
    #[arg(long)]
    pub strict_permissions: bool,

    #[command(flatten)]
    pub server: ServerArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployOpError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
    #[error(transparent)]
    Server(#[from] HttpServerError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

#[derive(Debug)]
pub struct DeployOutput {
    deployment: Deployment,
    base_url: url::Url,
}

impl fmt::Display for DeployOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deployment = &self.deployment;
        writeln!(f, "Deployed {}", deployment.id)?;
        writeln!(f, "  key:      {}", deployment.key_path.display())?;
        writeln!(f, "  artifact: {}", deployment.artifact_path.display())?;
        write!(f, "  manifest: {}{}.xml", self.base_url, deployment.id)?;
        for path in &deployment.policy_paths {
            write!(f, "\n  policy:   {}", path.display())?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Deploy {
    type Error = DeployOpError;
    type Output = DeployOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut state = ctx.state()?;
        self.server.apply(&mut state.config);
        if self.strict_permissions {
            state.config.relax_permissions = false;
        }

        let _guards = ctx.init_logging();

        let (shutdown_waiter, _shutdown_tx, _shutdown_rx) =
            graceful_shutdown_blocker().map_err(DeployOpError::Signals)?;

        let server = Server::start(
            http_server::Config::new(
                state.config.listen_addr(),
                state.config.advertised_url.clone(),
            ),
            ArtifactStore::new(&state.artifacts_path),
        )
        .await?;
        let base_url = server.base_url().clone();

        let deployed = match Deployer::from_state(&state, &self.browser, base_url.clone()) {
            Ok(deployer) => deployer
                .deploy(&self.extension, &vendors_or_all(&self.vendors))
                .await
                .map_err(DeployOpError::from),
            Err(e) => Err(e.into()),
        };

        let deployment = match deployed {
            Ok(deployment) => deployment,
            Err(e) => {
                server.stop().await?;
                return Err(e);
            }
        };

        if !self.detach {
            tracing::info!(id = %deployment.id, "serving until interrupted");
            let _ = shutdown_waiter.await;
        }
        server.stop().await?;

        Ok(DeployOutput {
            deployment,
            base_url,
        })
    }
}
