use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use url::Url;

use depot_daemon::state::{AppConfig, PORT_ENV_VAR};

#[derive(Parser, Debug)]
#[command(name = "depot")]
#[command(about = "Sign, serve and force-install Chromium extensions")]
#[command(version)]
pub struct Args {
    /// Path to the depot state directory (defaults to ~/.depot)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level for commands that log (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    /// Directory for daily rolling log files (stderr only if not set)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}

/// Update server overrides shared by every command that serves
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Address to bind (default from config)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to bind (default from config)
    #[arg(long, env = PORT_ENV_VAR)]
    pub port: Option<u16>,

    /// Base URL written into policies and manifests, when browsers reach
    /// the server through something other than the bind address
    #[arg(long)]
    pub advertised_url: Option<Url>,
}

impl ServerArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.advertised_url {
            config.advertised_url = Some(url.clone());
        }
    }
}
