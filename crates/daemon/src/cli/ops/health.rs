use clap::Args;
use url::Url;

use depot_daemon::http_server::{self, ConfigError};
use depot_daemon::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Health {
    /// Server to check (default: the configured listen address)
    #[arg(long)]
    pub url: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("update server at {url} is not reachable: {source}")]
    Unreachable {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("update server at {url} is unhealthy ({status})")]
    Unhealthy {
        url: Url,
        status: reqwest::StatusCode,
    },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let base = match &self.url {
            Some(url) => url.clone(),
            None => {
                let config = ctx.state()?.config;
                let addr = config.listen_addr();
                http_server::Config::new(addr, config.advertised_url).base_url(addr)?
            }
        };
        let livez = base.join("_status/livez")?;

        let response = reqwest::get(livez.clone())
            .await
            .map_err(|source| HealthError::Unreachable {
                url: base.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(HealthError::Unhealthy {
                url: base,
                status: response.status(),
            });
        }

        Ok(format!("Update server ({}):\n  livez: OK", base))
    }
}
