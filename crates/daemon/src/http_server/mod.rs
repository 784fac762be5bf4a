use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;
use url::Url;

use common::store::ArtifactStore;

mod config;
pub mod handlers;
mod health;

pub use config::{Config, ConfigError};

const STATUS_PREFIX: &str = "/_status";

/// Immutable state shared by every request handler
#[derive(Debug, Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

#[derive(Debug)]
struct ServerStateInner {
    store: ArtifactStore,
    base_url: Url,
}

impl ServerState {
    pub fn new(store: ArtifactStore, base_url: Url) -> Self {
        Self {
            inner: Arc::new(ServerStateInner { store, base_url }),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.inner.store
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }
}

/// Build the update server's router
pub fn router(state: ServerState, log_level: tracing::Level) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    Router::new()
        .nest(STATUS_PREFIX, health::router())
        .route("/:resource", get(handlers::extension::handler))
        .fallback(handlers::not_found_handler)
        .with_state(state)
        .layer(trace_layer)
}

/// A running update server
///
/// Dropping the handle without calling [`Server::stop`] also shuts the
/// server down, but nothing waits for in-flight requests to finish.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    base_url: Url,
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<Result<(), HttpServerError>>,
}

impl Server {
    /// Bind `config.listen_addr` and start serving artifacts from `store`
    pub async fn start(config: Config, store: ArtifactStore) -> Result<Self, HttpServerError> {
        let listener = tokio::net::TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| HttpServerError::BindFailed {
                addr: config.listen_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;
        let base_url = config.base_url(local_addr)?;

        let router = router(ServerState::new(store, base_url.clone()), config.log_level);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await?;
            Ok::<(), HttpServerError>(())
        });

        tracing::info!(addr = %local_addr, base_url = %base_url, "update server listening");

        Ok(Self {
            local_addr,
            base_url,
            shutdown_tx,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL prefix browsers use for `<id>.xml` and `<id>.crx`, always ending in `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(self) -> Result<(), HttpServerError> {
        let _ = self.shutdown_tx.send(());
        self.handle.await??;
        tracing::info!(addr = %self.local_addr, "update server stopped");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("invalid server configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
