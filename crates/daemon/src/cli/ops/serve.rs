use clap::Args;

use common::store::ArtifactStore;
use depot_daemon::http_server::{self, HttpServerError, Server};
use depot_daemon::process::graceful_shutdown_blocker;
use depot_daemon::state::StateError;

use crate::cli::args::ServerArgs;

#[derive(Args, Debug, Clone)]
pub struct Serve {
    #[command(flatten)]
    pub server: ServerArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
    #[error(transparent)]
    Server(#[from] HttpServerError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let mut config = state.config.clone();
        self.server.apply(&mut config);

        let _guards = ctx.init_logging();

        let (shutdown_waiter, _shutdown_tx, _shutdown_rx) =
            graceful_shutdown_blocker().map_err(ServeError::Signals)?;

        let server = Server::start(
            http_server::Config::new(config.listen_addr(), config.advertised_url.clone()),
            ArtifactStore::new(&state.artifacts_path),
        )
        .await?;

        let _ = shutdown_waiter.await;
        server.stop().await?;

        Ok("update server stopped".to_string())
    }
}
